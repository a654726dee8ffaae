//! Webhook ingestion: authenticate, resolve, classify, apply.
//!
//! The gateway disables a webhook subscription that ever receives a non-2xx
//! response or a timeout, so ingestion never propagates internal failures.
//! Every outcome is absorbed into a [`Disposition`] that the HTTP layer
//! acknowledges with 200; the reasons live in the logs.

use crate::config::AuthorizeNetConfig;
use crate::reconcile::host::{HostError, OrderHost};
use crate::reconcile::types::{
    order_code_prefix, parse_refund_invoice, PaymentAttempt, PaymentState,
};
use crate::reference::ReferenceStore;
use crate::webhook::signature::signature_matches;
use bigdecimal::BigDecimal;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Notification outcome, acknowledged with 200 regardless of variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    Ok,
    NotInterested,
    UnknownPayment,
    InvalidSignature,
}

impl Disposition {
    /// Plaintext acknowledgment body.
    pub fn body(&self) -> &'static str {
        match self {
            Disposition::Ok => "OK",
            Disposition::NotInterested => "Not interested.",
            Disposition::UnknownPayment => "Unknown payment.",
            Disposition::InvalidSignature => "Invalid signature",
        }
    }
}

/// Gateway event classification. Unmodeled types are kept as `Other` for
/// forward compatibility and acknowledged without state changes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WebhookEventType {
    VoidCreated,
    RefundCreated,
    FraudDeclined,
    Other(String),
}

impl From<&str> for WebhookEventType {
    fn from(value: &str) -> Self {
        match value {
            "net.authorize.payment.void.created" => WebhookEventType::VoidCreated,
            "net.authorize.payment.refund.created" => WebhookEventType::RefundCreated,
            "net.authorize.payment.fraud.declined" => WebhookEventType::FraudDeclined,
            other => WebhookEventType::Other(other.to_string()),
        }
    }
}

struct ResolvedNotification {
    payment: PaymentAttempt,
    order_code: String,
}

pub struct WebhookIngestor {
    index: Arc<dyn ReferenceStore>,
    host: Arc<dyn OrderHost>,
    config: AuthorizeNetConfig,
}

impl WebhookIngestor {
    pub fn new(
        index: Arc<dyn ReferenceStore>,
        host: Arc<dyn OrderHost>,
        config: AuthorizeNetConfig,
    ) -> Self {
        Self {
            index,
            host,
            config,
        }
    }

    /// Process one notification. `raw_body` must be the unparsed request body;
    /// the signature covers its exact bytes.
    pub async fn ingest(&self, raw_body: &[u8], signature_header: Option<&str>) -> Disposition {
        let data: JsonValue = match serde_json::from_slice(raw_body) {
            Ok(value) => value,
            Err(e) => {
                info!(error = %e, "discarding unparseable webhook body");
                return Disposition::NotInterested;
            }
        };

        let payload = data.get("payload").cloned().unwrap_or(JsonValue::Null);
        if payload.get("entityName").and_then(|v| v.as_str()) != Some("transaction") {
            return Disposition::NotInterested;
        }

        let resolved = match self.resolve(&payload).await {
            Some(resolved) => resolved,
            None => {
                // May be a retry for data this system no longer has; the
                // gateway must still see success.
                info!(payload = %payload, "webhook for unknown payment");
                return Disposition::UnknownPayment;
            }
        };

        let signature_ok = signature_header
            .map(|header| signature_matches(raw_body, header, &self.config.signature_key))
            .unwrap_or(false);
        if !signature_ok {
            info!(
                order = %resolved.order_code,
                "webhook with missing or invalid signature"
            );
            return Disposition::InvalidSignature;
        }

        // Verified: retain the full notification on the order's audit trail
        // before any state change.
        if let Err(e) = self
            .host
            .log_action(&resolved.order_code, "authorizenet.event", data.clone())
            .await
        {
            error!(order = %resolved.order_code, error = %e, "failed to audit-log webhook");
            return Disposition::Ok;
        }

        self.apply(&resolved, &data, &payload).await;
        Disposition::Ok
    }

    /// Resolve the notification to a local payment attempt. Precedence:
    /// direct transaction-id match, then the refund invoice-number form
    /// `{orderCode}-R-{seq}`, then the imprecise order-code prefix fallback.
    async fn resolve(&self, payload: &JsonValue) -> Option<ResolvedNotification> {
        if let Some(id) = json_string(payload.get("id")) {
            match self.index.lookup_by_reference(&id).await {
                Ok(Some(record)) => {
                    if let Some(payment) = self.load_payment(&record.payment_full_id).await {
                        return Some(ResolvedNotification {
                            payment,
                            order_code: record.order_code,
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(reference = %id, error = %e, "reference lookup failed");
                    return None;
                }
            }
        }

        let invoice = payload.get("invoiceNumber").and_then(|v| v.as_str())?;

        if let Some((order_code, local_id)) = parse_refund_invoice(invoice) {
            match self.host.refund_by_invoice(&order_code, local_id).await {
                Ok(Some(refund)) => {
                    if let Some(payment) = self.load_payment(&refund.payment_full_id).await {
                        return Some(ResolvedNotification {
                            payment,
                            order_code,
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    error!(invoice = %invoice, error = %e, "refund lookup failed");
                    return None;
                }
            }
        }

        let prefix = order_code_prefix(invoice);
        match self.index.lookup_by_order_code(prefix).await {
            Ok(Some(record)) => {
                let payment = self.load_payment(&record.payment_full_id).await?;
                Some(ResolvedNotification {
                    payment,
                    order_code: record.order_code,
                })
            }
            Ok(None) => None,
            Err(e) => {
                error!(order = %prefix, error = %e, "order-code lookup failed");
                None
            }
        }
    }

    async fn load_payment(&self, full_id: &str) -> Option<PaymentAttempt> {
        match self.host.payment_by_full_id(full_id).await {
            Ok(payment) => payment,
            Err(e) => {
                error!(payment = %full_id, error = %e, "payment lookup failed");
                None
            }
        }
    }

    /// Apply the single state transition this event type maps to. Failures
    /// are logged and absorbed; duplicate deliveries are no-ops at the
    /// collaborator boundary.
    async fn apply(&self, resolved: &ResolvedNotification, data: &JsonValue, payload: &JsonValue) {
        let event_type = data.get("eventType").and_then(|v| v.as_str()).unwrap_or("");

        match WebhookEventType::from(event_type) {
            WebhookEventType::VoidCreated => {
                let amount = resolved.payment.refundable_amount();
                self.external_refund(resolved, amount, payload).await;
            }
            WebhookEventType::RefundCreated => {
                let amount = json_string(payload.get("authAmount"))
                    .and_then(|raw| BigDecimal::from_str(&raw).ok());
                match amount {
                    Some(amount) => self.external_refund(resolved, amount, payload).await,
                    None => {
                        warn!(
                            order = %resolved.order_code,
                            "refund notification without a parseable authAmount"
                        );
                    }
                }
            }
            WebhookEventType::FraudDeclined => {
                // A payment that was already refunded is concluded and must
                // not be re-failed by a late fraud verdict.
                if resolved.payment.state == PaymentState::Refunded {
                    debug!(
                        payment = %resolved.payment.full_id,
                        "fraud decline for an already refunded payment, no-op"
                    );
                    return;
                }
                match self
                    .host
                    .fail_payment(&resolved.payment, None, "fraud declined by gateway")
                    .await
                {
                    Ok(true) => {
                        info!(payment = %resolved.payment.full_id, "payment failed after fraud decline")
                    }
                    Ok(false) => {
                        debug!(
                            payment = %resolved.payment.full_id,
                            "payment state forbids failing, no-op"
                        )
                    }
                    Err(e) => {
                        error!(payment = %resolved.payment.full_id, error = %e, "failed to apply fraud decline")
                    }
                }
            }
            WebhookEventType::Other(other) => {
                debug!(event_type = %other, "event type not modeled, acknowledged without action");
            }
        }
    }

    async fn external_refund(
        &self,
        resolved: &ResolvedNotification,
        amount: BigDecimal,
        payload: &JsonValue,
    ) {
        let reference = json_string(payload.get("id")).unwrap_or_default();
        match self
            .host
            .create_external_refund(&resolved.payment, amount, &reference, payload.clone())
            .await
        {
            Ok(()) => {
                info!(
                    payment = %resolved.payment.full_id,
                    reference = %reference,
                    "external refund recorded from webhook"
                );
            }
            // Redelivery of an already-applied notification; deliberately
            // silent so the gateway sees success and stops retrying.
            Err(HostError::DuplicateExternalRefund { .. }) => {
                debug!(
                    payment = %resolved.payment.full_id,
                    reference = %reference,
                    "external refund already recorded"
                );
            }
            Err(e) => {
                error!(
                    payment = %resolved.payment.full_id,
                    error = %e,
                    "failed to record external refund"
                );
            }
        }
    }
}

/// The gateway is inconsistent about numeric fields; accept both strings and
/// numbers, preserving the exact decimal text.
fn json_string(value: Option<&JsonValue>) -> Option<String> {
    match value? {
        JsonValue::String(s) => Some(s.clone()),
        JsonValue::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn disposition_bodies() {
        assert_eq!(Disposition::Ok.body(), "OK");
        assert_eq!(Disposition::NotInterested.body(), "Not interested.");
        assert_eq!(Disposition::UnknownPayment.body(), "Unknown payment.");
        assert_eq!(Disposition::InvalidSignature.body(), "Invalid signature");
    }

    #[test]
    fn event_type_classification() {
        assert_eq!(
            WebhookEventType::from("net.authorize.payment.void.created"),
            WebhookEventType::VoidCreated
        );
        assert_eq!(
            WebhookEventType::from("net.authorize.payment.refund.created"),
            WebhookEventType::RefundCreated
        );
        assert_eq!(
            WebhookEventType::from("net.authorize.payment.fraud.declined"),
            WebhookEventType::FraudDeclined
        );
        assert!(matches!(
            WebhookEventType::from("net.authorize.payment.authcapture.created"),
            WebhookEventType::Other(_)
        ));
    }

    #[test]
    fn json_string_accepts_strings_and_numbers() {
        assert_eq!(
            json_string(Some(&json!("40098176700"))).as_deref(),
            Some("40098176700")
        );
        assert_eq!(json_string(Some(&json!(9.6))).as_deref(), Some("9.6"));
        assert_eq!(json_string(Some(&json!({}))), None);
        assert_eq!(json_string(None), None);
    }
}
