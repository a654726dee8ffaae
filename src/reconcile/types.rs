//! Local payment and refund records as seen by the reconciliation core.
//!
//! The hosting application owns these rows; this crate receives snapshots and
//! mutates their payment-state fields only through [`crate::reconcile::host::OrderHost`].

use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub use crate::gateway::types::OpaqueData;

/// Marker separating the order code from the local refund sequence in refund
/// invoice numbers, e.g. `ABC12-R-2`.
pub const REFUND_INVOICE_MARKER: &str = "-R-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentState {
    Created,
    Pending,
    Confirmed,
    Failed,
    Canceled,
    Refunded,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefundState {
    Created,
    Pending,
    Done,
    Failed,
}

/// One checkout payment attempt. `full_id` doubles as the gateway invoice
/// number and must fit its 20-character limit.
#[derive(Debug, Clone)]
pub struct PaymentAttempt {
    pub full_id: String,
    pub order_code: String,
    pub amount: BigDecimal,
    pub currency: String,
    /// Tokenized payment data captured once per attempt by the client-side
    /// script. Absent on attempts that never reached the payment form.
    pub token: Option<OpaqueData>,
    pub state: PaymentState,
    /// Last raw gateway response, verbatim.
    pub info: Option<JsonValue>,
    /// Total of done refunds against this attempt, as tracked by the host.
    pub refunded_amount: BigDecimal,
    pub shredded: bool,
}

impl PaymentAttempt {
    /// Gateway transaction id from the stored authorize/capture response.
    pub fn gateway_reference(&self) -> Option<&str> {
        self.info
            .as_ref()?
            .get("transactionResponse")?
            .get("transId")?
            .as_str()
    }

    /// Last four digits of the card, from the masked account number in the
    /// stored response (e.g. `XXXX1111`).
    pub fn card_last4(&self) -> Option<String> {
        let account = self
            .info
            .as_ref()?
            .get("transactionResponse")?
            .get("accountNumber")?
            .as_str()?;
        if account.len() < 4 {
            return None;
        }
        let tail: String = account
            .chars()
            .rev()
            .take(4)
            .collect::<String>()
            .chars()
            .rev()
            .collect();
        Some(tail)
    }

    /// Amount still open for refunding.
    pub fn refundable_amount(&self) -> BigDecimal {
        &self.amount - &self.refunded_amount
    }
}

/// One refund (full or partial) against a confirmed [`PaymentAttempt`].
#[derive(Debug, Clone)]
pub struct RefundRequest {
    /// Derived from order code and local sequence, e.g. `ABC12-R-1`.
    pub full_id: String,
    pub local_id: u32,
    pub order_code: String,
    pub payment_full_id: String,
    pub amount: BigDecimal,
    pub state: RefundState,
    pub info: Option<JsonValue>,
}

/// Parse a refund invoice number of the form `{orderCode}-R-{seq}`.
pub fn parse_refund_invoice(invoice: &str) -> Option<(String, u32)> {
    let idx = invoice.find(REFUND_INVOICE_MARKER)?;
    let order_code = &invoice[..idx];
    let seq: u32 = invoice[idx + REFUND_INVOICE_MARKER.len()..].parse().ok()?;
    if order_code.is_empty() {
        return None;
    }
    Some((order_code.to_string(), seq))
}

/// The order-code prefix of an invoice number, used by the best-effort
/// fallback lookup when a notification carries no resolvable transaction id.
pub fn order_code_prefix(invoice: &str) -> &str {
    invoice.split('-').next().unwrap_or(invoice)
}

/// Redact personal data from a stored gateway response once retention
/// expires. Keeps only the fields needed for later reconciliation.
pub fn shred_payment_info(info: &mut JsonValue) {
    const KEEP: [&str; 4] = ["accountType", "messages", "transId", "networkTransId"];

    if let Some(tx) = info
        .get_mut("transactionResponse")
        .and_then(|v| v.as_object_mut())
    {
        let keys: Vec<String> = tx.keys().cloned().collect();
        for key in keys {
            if !KEEP.contains(&key.as_str()) {
                tx[&key] = JsonValue::String("█".to_string());
            }
        }
    }
    info["_shredded"] = JsonValue::Bool(true);
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn confirmed_attempt() -> PaymentAttempt {
        PaymentAttempt {
            full_id: "ABC12-P-1".to_string(),
            order_code: "ABC12".to_string(),
            amount: BigDecimal::from_str("9.60").unwrap(),
            currency: "USD".to_string(),
            token: None,
            state: PaymentState::Confirmed,
            info: Some(json!({
                "transactionResponse": {
                    "transId": "40098176700",
                    "accountNumber": "XXXX1111",
                    "accountType": "Visa",
                    "authCode": "ZXY987"
                },
                "messages": {"resultCode": "Ok"}
            })),
            refunded_amount: BigDecimal::from(0),
            shredded: false,
        }
    }

    #[test]
    fn gateway_reference_reads_stored_response() {
        assert_eq!(
            confirmed_attempt().gateway_reference(),
            Some("40098176700")
        );

        let mut attempt = confirmed_attempt();
        attempt.info = None;
        assert_eq!(attempt.gateway_reference(), None);
    }

    #[test]
    fn card_last4_from_masked_account_number() {
        assert_eq!(confirmed_attempt().card_last4().as_deref(), Some("1111"));
    }

    #[test]
    fn refundable_amount_subtracts_prior_refunds() {
        let mut attempt = confirmed_attempt();
        attempt.refunded_amount = BigDecimal::from_str("3.10").unwrap();
        assert_eq!(
            attempt.refundable_amount(),
            BigDecimal::from_str("6.50").unwrap()
        );
    }

    #[test]
    fn refund_invoice_parsing() {
        assert_eq!(
            parse_refund_invoice("ABC12-R-2"),
            Some(("ABC12".to_string(), 2))
        );
        assert_eq!(parse_refund_invoice("ABC12-P-1"), None);
        assert_eq!(parse_refund_invoice("-R-1"), None);
        assert_eq!(parse_refund_invoice("ABC12-R-x"), None);
    }

    #[test]
    fn order_code_prefix_splits_invoice() {
        assert_eq!(order_code_prefix("ABC12-P-1"), "ABC12");
        assert_eq!(order_code_prefix("ABC12"), "ABC12");
    }

    #[test]
    fn shredding_keeps_reconciliation_fields_only() {
        let mut info = confirmed_attempt().info.unwrap();
        shred_payment_info(&mut info);

        let tx = &info["transactionResponse"];
        assert_eq!(tx["transId"], "40098176700");
        assert_eq!(tx["accountType"], "Visa");
        assert_eq!(tx["accountNumber"], "█");
        assert_eq!(tx["authCode"], "█");
        assert_eq!(info["_shredded"], true);
    }
}
