//! Refund resolution with the refund-to-void settlement fallback.
//!
//! The gateway only accepts a true refund once the original transaction has
//! settled (roughly a day after capture). Before that it must be voided
//! instead. The resolver first attempts the refund and, when the gateway
//! answers with its "not yet settled" error and the refund covers the full
//! original amount, retries exactly once as a void.

use crate::config::AuthorizeNetConfig;
use crate::gateway::types::{CreditCardRef, GatewayResponse, OrderFields, TransactionRequest};
use crate::gateway::GatewayApi;
use crate::reconcile::error::{ReconcileError, ReconcileResult};
use crate::reconcile::executor::UNREACHABLE_MESSAGE;
use crate::reconcile::host::OrderHost;
use crate::reconcile::types::{PaymentAttempt, PaymentState, RefundRequest};
use bigdecimal::BigDecimal;
use serde_json::json;
use std::sync::Arc;
use tracing::{error, info};

/// Gateway error code for "the referenced transaction has not settled yet".
pub const SETTLEMENT_PENDING_ERROR: &str = "54";

/// Bounded two-step state machine: one refund attempt, at most one void
/// follow-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RefundPhase {
    Attempting,
    AttemptingVoid,
}

pub struct RefundResolver {
    gateway: Arc<dyn GatewayApi>,
    host: Arc<dyn OrderHost>,
    config: AuthorizeNetConfig,
}

impl RefundResolver {
    pub fn new(
        gateway: Arc<dyn GatewayApi>,
        host: Arc<dyn OrderHost>,
        config: AuthorizeNetConfig,
    ) -> Self {
        Self {
            gateway,
            host,
            config,
        }
    }

    /// Execute `refund` against its confirmed parent `payment`.
    pub async fn refund(
        &self,
        refund: &RefundRequest,
        payment: &PaymentAttempt,
    ) -> ReconcileResult<()> {
        if payment.state != PaymentState::Confirmed {
            return Err(ReconcileError::Validation {
                message: "refunds require a confirmed payment".to_string(),
                field: Some("payment".to_string()),
            });
        }
        if refund.amount <= BigDecimal::from(0) || refund.amount > payment.refundable_amount() {
            return Err(ReconcileError::Validation {
                message: format!(
                    "refund amount {} exceeds the refundable amount {}",
                    refund.amount,
                    payment.refundable_amount()
                ),
                field: Some("amount".to_string()),
            });
        }
        let trans_id = payment
            .gateway_reference()
            .ok_or_else(|| ReconcileError::Validation {
                message: "payment has no stored gateway transaction id".to_string(),
                field: Some("info".to_string()),
            })?
            .to_string();

        let mut phase = RefundPhase::Attempting;
        loop {
            let request = match phase {
                RefundPhase::Attempting => {
                    let last4 =
                        payment
                            .card_last4()
                            .ok_or_else(|| ReconcileError::Validation {
                                message: "stored gateway response has no account number"
                                    .to_string(),
                                field: Some("info".to_string()),
                            })?;
                    let description =
                        format!("{} / {}", refund.order_code, self.config.event_label);
                    TransactionRequest::refund(
                        &refund.amount.to_string(),
                        &payment.currency,
                        CreditCardRef {
                            card_number: last4,
                            expiration_date: "XXXX".to_string(),
                        },
                        &trans_id,
                        OrderFields::new(&refund.full_id, &description),
                    )
                }
                RefundPhase::AttemptingVoid => TransactionRequest::void(&trans_id),
            };

            let raw = match self
                .gateway
                .create_transaction(&refund.full_id, request)
                .await
            {
                Ok(raw) => raw,
                Err(e) => {
                    error!(refund = %refund.full_id, error = %e, "failed to contact gateway");
                    let note = json!({ "error": true, "message": e.to_string() });
                    self.host.fail_refund(refund, note, &e.to_string()).await?;
                    self.host
                        .log_action(
                            &refund.order_code,
                            "authorizenet.refund.failed",
                            json!({ "local_id": refund.local_id, "message": e.to_string() }),
                        )
                        .await?;
                    return Err(ReconcileError::ProviderUnavailable {
                        message: UNREACHABLE_MESSAGE.to_string(),
                    });
                }
            };

            let response = GatewayResponse::from_value(&raw).map_err(|e| {
                ReconcileError::ProviderUnavailable {
                    message: format!("unrecognized gateway response: {}", e),
                }
            })?;

            if response.is_approved() {
                self.host.refund_done(refund, raw).await?;
                info!(
                    refund = %refund.full_id,
                    voided = phase == RefundPhase::AttemptingVoid,
                    "refund completed"
                );
                return Ok(());
            }

            // A void can only ever return the full captured amount, so the
            // fallback is limited to full refunds.
            if phase == RefundPhase::Attempting
                && response.has_error_code(SETTLEMENT_PENDING_ERROR)
                && refund.amount == payment.amount
            {
                info!(
                    refund = %refund.full_id,
                    "transaction not yet settled, retrying as void"
                );
                phase = RefundPhase::AttemptingVoid;
                continue;
            }

            let log_message = response.log_message();
            self.host.fail_refund(refund, raw, &log_message).await?;
            self.host
                .log_action(
                    &refund.order_code,
                    "authorizenet.refund.failed",
                    json!({ "local_id": refund.local_id, "message": log_message }),
                )
                .await?;
            return Err(ReconcileError::RefundFailed {
                message: response.display_message(),
            });
        }
    }
}
