//! Collaborator contract towards the hosting application.
//!
//! The host owns orders, payments and refunds and provides row-level
//! atomicity for their state transitions; this crate calls through this
//! trait and never touches host storage directly.

use crate::reconcile::types::{PaymentAttempt, RefundRequest};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use serde_json::Value as JsonValue;
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum HostError {
    /// An external refund for this gateway reference already exists. The
    /// webhook ingestor treats this as an already-applied notification.
    #[error("duplicate external refund for reference {reference}")]
    DuplicateExternalRefund { reference: String },

    #[error("host storage error: {message}")]
    Storage { message: String },
}

/// Operations the hosting application must provide.
#[async_trait]
pub trait OrderHost: Send + Sync {
    /// Move the attempt to confirmed and persist the raw gateway response.
    /// Must be a one-way transition: a confirmed attempt stays confirmed.
    async fn confirm_payment(
        &self,
        payment: &PaymentAttempt,
        info: JsonValue,
    ) -> Result<(), HostError>;

    /// Try to move the attempt to failed, persisting `info` and writing
    /// `log_message` to the order's audit trail. Returns whether the
    /// transition happened; some states forbid re-failing.
    async fn fail_payment(
        &self,
        payment: &PaymentAttempt,
        info: Option<JsonValue>,
        log_message: &str,
    ) -> Result<bool, HostError>;

    /// Persist a raw gateway response on the attempt without changing state.
    async fn record_payment_info(
        &self,
        payment: &PaymentAttempt,
        info: JsonValue,
    ) -> Result<(), HostError>;

    /// Move the refund to done and persist the raw gateway response.
    async fn refund_done(&self, refund: &RefundRequest, info: JsonValue) -> Result<(), HostError>;

    /// Move the refund to failed, persisting `info` and the failure message.
    async fn fail_refund(
        &self,
        refund: &RefundRequest,
        info: JsonValue,
        log_message: &str,
    ) -> Result<(), HostError>;

    /// Record a refund that originated outside this system (merchant-console
    /// void or refund reported by webhook). Must be idempotent per gateway
    /// `reference`: a second call for the same reference returns
    /// [`HostError::DuplicateExternalRefund`].
    async fn create_external_refund(
        &self,
        payment: &PaymentAttempt,
        amount: BigDecimal,
        reference: &str,
        info: JsonValue,
    ) -> Result<(), HostError>;

    /// Append an entry to the order's audit log.
    async fn log_action(
        &self,
        order_code: &str,
        action: &str,
        data: JsonValue,
    ) -> Result<(), HostError>;

    /// Load the current snapshot of a payment attempt.
    async fn payment_by_full_id(
        &self,
        full_id: &str,
    ) -> Result<Option<PaymentAttempt>, HostError>;

    /// Load a refund by its order code and local sequence number, as parsed
    /// from a gateway invoice number.
    async fn refund_by_invoice(
        &self,
        order_code: &str,
        local_id: u32,
    ) -> Result<Option<RefundRequest>, HostError>;
}
