//! Error taxonomy for gateway-facing operations.
//!
//! Webhook-only conditions (invalid signature, unresolved notification) are
//! not errors; the ingestor absorbs them into a disposition and never lets
//! them escape as failures.

use crate::gateway::GatewayError;
use crate::reconcile::host::HostError;
use crate::reference::IndexError;
use thiserror::Error;

pub type ReconcileResult<T> = Result<T, ReconcileError>;

#[derive(Debug, Clone, Error)]
pub enum ReconcileError {
    /// Transport or HTTP failure before a definitive remote outcome. Always
    /// retriable by the caller; no remote state was changed.
    #[error("Payment provider unavailable: {message}")]
    ProviderUnavailable { message: String },

    /// Definitive remote rejection of an authorize/capture. Terminal for this
    /// attempt; the caller may start a new one.
    #[error("Payment declined: {message}")]
    PaymentDeclined { message: String },

    /// Definitive remote rejection of a refund or void, after the void
    /// fallback was attempted where applicable.
    #[error("Refund failed: {message}")]
    RefundFailed { message: String },

    /// A gateway transaction id collided with an existing reference record.
    /// Gateway ids are globally unique, so this is an invariant violation.
    #[error("Duplicate gateway reference: {reference}")]
    DuplicateReference { reference: String },

    #[error("Validation error: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    #[error("Reference index error: {message}")]
    Index { message: String },

    #[error("Host error: {message}")]
    Host { message: String },
}

impl ReconcileError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReconcileError::ProviderUnavailable { .. })
    }

    /// Message suitable for showing to the paying customer.
    pub fn user_message(&self) -> String {
        match self {
            ReconcileError::ProviderUnavailable { message } => message.clone(),
            ReconcileError::PaymentDeclined { message } => message.clone(),
            ReconcileError::RefundFailed { message } => message.clone(),
            ReconcileError::Validation { message, .. } => message.clone(),
            ReconcileError::DuplicateReference { .. }
            | ReconcileError::Index { .. }
            | ReconcileError::Host { .. } => {
                "Payment processing failed. Please contact support".to_string()
            }
        }
    }
}

impl From<GatewayError> for ReconcileError {
    fn from(err: GatewayError) -> Self {
        ReconcileError::ProviderUnavailable {
            message: err.to_string(),
        }
    }
}

impl From<IndexError> for ReconcileError {
    fn from(err: IndexError) -> Self {
        match err {
            IndexError::Duplicate { reference } => ReconcileError::DuplicateReference { reference },
            IndexError::Storage { message } => ReconcileError::Index { message },
        }
    }
}

impl From<HostError> for ReconcileError {
    fn from(err: HostError) -> Self {
        ReconcileError::Host {
            message: err.to_string(),
        }
    }
}
