//! Authorize/capture execution for new payment attempts.

use crate::config::AuthorizeNetConfig;
use crate::gateway::types::{GatewayResponse, OrderFields, TransactionRequest};
use crate::gateway::GatewayApi;
use crate::reconcile::error::{ReconcileError, ReconcileResult};
use crate::reconcile::host::OrderHost;
use crate::reconcile::types::PaymentAttempt;
use crate::reference::{NewReference, ReferenceStore};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Substring the gateway uses in its decline texts. When present, the payer
/// gets a friendlier message than the raw gateway wording.
const DECLINE_PHRASE: &str = "transaction has been declined";

/// Message shown to the payer when the gateway reports a card decline.
pub const DECLINED_MESSAGE: &str = "Your credit card has been declined. You can retry with the \
     same or a different card. If your payment is not completed, your order will automatically \
     be canceled again.";

/// Message shown to the payer when the gateway could not be reached.
pub const UNREACHABLE_MESSAGE: &str =
    "We were unable to contact Authorize.Net. Please try again later.";

/// Drives the authorize/capture call for one payment attempt and interprets
/// the result into a local payment outcome.
pub struct TransactionExecutor {
    gateway: Arc<dyn GatewayApi>,
    index: Arc<dyn ReferenceStore>,
    host: Arc<dyn OrderHost>,
    config: AuthorizeNetConfig,
}

impl TransactionExecutor {
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        index: Arc<dyn ReferenceStore>,
        host: Arc<dyn OrderHost>,
        config: AuthorizeNetConfig,
    ) -> Self {
        Self {
            gateway,
            index,
            host,
            config,
        }
    }

    /// Execute one authorize-and-capture for `attempt`.
    ///
    /// On approval the attempt is confirmed and exactly one reference record
    /// is created, keyed by the returned transaction id. Any definitive
    /// rejection surfaces as [`ReconcileError::PaymentDeclined`]; only a
    /// transport/HTTP failure surfaces as
    /// [`ReconcileError::ProviderUnavailable`].
    pub async fn authorize_and_capture(&self, attempt: &PaymentAttempt) -> ReconcileResult<()> {
        let token = attempt
            .token
            .clone()
            .ok_or_else(|| ReconcileError::Validation {
                message: "payment attempt has no captured token".to_string(),
                field: Some("token".to_string()),
            })?;

        let description = format!("{} / {}", attempt.order_code, self.config.event_label);
        let request = TransactionRequest::auth_capture(
            &attempt.amount.to_string(),
            &attempt.currency,
            token,
            OrderFields::new(&attempt.full_id, &description),
            &attempt.order_code,
        );

        let raw = match self
            .gateway
            .create_transaction(&attempt.full_id, request)
            .await
        {
            Ok(raw) => raw,
            Err(e) => {
                error!(payment = %attempt.full_id, error = %e, "failed to contact gateway");
                let note = json!({ "error": true, "message": e.to_string() });
                let _ = self
                    .host
                    .fail_payment(attempt, Some(note), &e.to_string())
                    .await?;
                return Err(ReconcileError::ProviderUnavailable {
                    message: UNREACHABLE_MESSAGE.to_string(),
                });
            }
        };

        self.host
            .log_action(&attempt.order_code, "authorizenet.result", raw.clone())
            .await?;

        let response =
            GatewayResponse::from_value(&raw).map_err(|e| ReconcileError::ProviderUnavailable {
                message: format!("unrecognized gateway response: {}", e),
            })?;

        if response.is_approved() {
            let trans_id = response
                .transaction_response
                .as_ref()
                .map(|t| t.trans_id.clone())
                .filter(|id| !id.is_empty())
                .ok_or_else(|| ReconcileError::ProviderUnavailable {
                    message: "approved response without a transaction id".to_string(),
                })?;

            match self
                .index
                .record(NewReference {
                    reference: trans_id.clone(),
                    order_code: attempt.order_code.clone(),
                    payment_full_id: attempt.full_id.clone(),
                })
                .await
            {
                Ok(_) => {}
                Err(e) => {
                    // A transaction-id collision would silently cross-wire two
                    // payments; never swallow it.
                    error!(
                        payment = %attempt.full_id,
                        reference = %trans_id,
                        error = %e,
                        "failed to record gateway reference"
                    );
                    return Err(e.into());
                }
            }

            self.host.record_payment_info(attempt, raw.clone()).await?;
            self.host.confirm_payment(attempt, raw).await?;
            info!(payment = %attempt.full_id, reference = %trans_id, "payment confirmed");
            Ok(())
        } else {
            let failed = self
                .host
                .fail_payment(attempt, Some(raw), &response.log_message())
                .await?;
            if !failed {
                warn!(
                    payment = %attempt.full_id,
                    "attempt could not be moved to failed from its current state"
                );
            }

            let display = response.display_message();
            let message = if display.contains(DECLINE_PHRASE) {
                DECLINED_MESSAGE.to_string()
            } else {
                display
            };
            info!(payment = %attempt.full_id, message = %message, "payment declined by gateway");
            Err(ReconcileError::PaymentDeclined { message })
        }
    }
}
