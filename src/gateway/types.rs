//! Wire types for `createTransactionRequest` and its response.
//!
//! The raw response stays an opaque `serde_json::Value` at the client
//! boundary; callers parse it into [`GatewayResponse`] immediately after each
//! call and never pass untyped maps further.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Hard limit the gateway imposes on `refId` and `order.invoiceNumber`.
pub const INVOICE_NUMBER_MAX: usize = 20;
/// Hard limit on `poNumber`.
pub const PO_NUMBER_MAX: usize = 25;
/// Hard limit on `order.description`.
pub const DESCRIPTION_MAX: usize = 255;

/// Truncate to at most `max` characters, respecting char boundaries.
pub fn truncated(value: &str, max: usize) -> String {
    value.chars().take(max).collect()
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MerchantAuthentication {
    pub name: String,
    pub transaction_key: String,
}

/// Tokenized payment data collected by the client-side script. Relayed as-is;
/// this crate never sees card numbers on the payment path.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct OpaqueData {
    pub data_descriptor: String,
    pub data_value: String,
}

/// Card reference for refund requests: last four digits plus a masked
/// expiration date, as the gateway requires for linked refunds.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreditCardRef {
    pub card_number: String,
    pub expiration_date: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub opaque_data: Option<OpaqueData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credit_card: Option<CreditCardRef>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderFields {
    pub invoice_number: String,
    pub description: String,
}

impl OrderFields {
    pub fn new(invoice_number: &str, description: &str) -> Self {
        Self {
            invoice_number: truncated(invoice_number, INVOICE_NUMBER_MAX),
            description: truncated(description, DESCRIPTION_MAX),
        }
    }
}

/// One `transactionRequest` body. Field order matters to the gateway's JSON
/// parser, so keep declarations in schema order.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionRequest {
    pub transaction_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub amount: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment: Option<PaymentData>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ref_trans_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<OrderFields>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub po_number: Option<String>,
}

impl TransactionRequest {
    /// A combined authorize-and-capture of tokenized payment data.
    pub fn auth_capture(
        amount: &str,
        currency: &str,
        token: OpaqueData,
        order: OrderFields,
        po_number: &str,
    ) -> Self {
        Self {
            transaction_type: "authCaptureTransaction".to_string(),
            amount: Some(amount.to_string()),
            currency_code: Some(currency.to_string()),
            payment: Some(PaymentData {
                opaque_data: Some(token),
                credit_card: None,
            }),
            ref_trans_id: None,
            order: Some(order),
            po_number: Some(truncated(po_number, PO_NUMBER_MAX)),
        }
    }

    /// A refund against a settled transaction.
    pub fn refund(
        amount: &str,
        currency: &str,
        card: CreditCardRef,
        ref_trans_id: &str,
        order: OrderFields,
    ) -> Self {
        Self {
            transaction_type: "refundTransaction".to_string(),
            amount: Some(amount.to_string()),
            currency_code: Some(currency.to_string()),
            payment: Some(PaymentData {
                opaque_data: None,
                credit_card: Some(card),
            }),
            ref_trans_id: Some(ref_trans_id.to_string()),
            order: Some(order),
            po_number: None,
        }
    }

    /// A void of an unsettled transaction. Only the reference is sent.
    pub fn void(ref_trans_id: &str) -> Self {
        Self {
            transaction_type: "voidTransaction".to_string(),
            amount: None,
            currency_code: None,
            payment: None,
            ref_trans_id: Some(ref_trans_id.to_string()),
            order: None,
            po_number: None,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTransactionRequest {
    pub merchant_authentication: MerchantAuthentication,
    pub ref_id: String,
    pub transaction_request: TransactionRequest,
}

impl CreateTransactionRequest {
    /// The full request envelope as posted to the gateway.
    pub fn envelope(&self) -> JsonValue {
        serde_json::json!({ "createTransactionRequest": self })
    }
}

/// Parsed gateway response. Every field defaults so that partial responses
/// (voids without transaction bodies, error-only responses) still parse.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GatewayResponse {
    pub transaction_response: Option<TransactionResponse>,
    pub messages: ResponseMessages,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMessages {
    pub result_code: String,
    pub message: Vec<ResponseMessage>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ResponseMessage {
    pub code: String,
    pub text: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionResponse {
    pub response_code: String,
    pub trans_id: String,
    pub network_trans_id: String,
    pub account_number: String,
    pub account_type: String,
    pub errors: Vec<TransactionError>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TransactionError {
    pub error_code: String,
    pub error_text: String,
}

impl GatewayResponse {
    pub fn from_value(raw: &JsonValue) -> Result<Self, serde_json::Error> {
        serde_json::from_value(raw.clone())
    }

    /// The single source of truth for transaction approval: the API-level
    /// result code and the transaction-level response code must both agree.
    pub fn is_approved(&self) -> bool {
        self.messages.result_code == "Ok"
            && self
                .transaction_response
                .as_ref()
                .is_some_and(|t| t.response_code == "1")
    }

    pub fn has_error_code(&self, code: &str) -> bool {
        self.transaction_response
            .as_ref()
            .is_some_and(|t| t.errors.iter().any(|e| e.error_code == code))
    }

    /// Human-readable failure text: transaction errors when present, API-level
    /// messages otherwise.
    pub fn display_message(&self) -> String {
        let errors: Vec<String> = self
            .transaction_response
            .iter()
            .flat_map(|t| &t.errors)
            .map(|e| format!("{}: {}", e.error_code, e.error_text))
            .collect();
        if !errors.is_empty() {
            return errors.join(", ");
        }
        self.messages
            .message
            .iter()
            .map(|m| format!("{}: {}", m.code, m.text))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Everything the gateway said, for audit logs: API-level messages first,
    /// then transaction errors.
    pub fn log_message(&self) -> String {
        self.messages
            .message
            .iter()
            .map(|m| format!("{}: {}", m.code, m.text))
            .chain(
                self.transaction_response
                    .iter()
                    .flat_map(|t| &t.errors)
                    .map(|e| format!("{}: {}", e.error_code, e.error_text)),
            )
            .collect::<Vec<_>>()
            .join(", ")
    }
}
