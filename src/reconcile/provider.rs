//! The payment-method contract the hosting application registers.
//!
//! Method variants are a closed enumeration sharing one capability trait;
//! today the gateway integration carries a single variant, credit card via
//! tokenized payment data.

use crate::config::AuthorizeNetConfig;
use crate::gateway::GatewayApi;
use crate::reconcile::error::ReconcileResult;
use crate::reconcile::executor::TransactionExecutor;
use crate::reconcile::host::OrderHost;
use crate::reconcile::refund::RefundResolver;
use crate::reconcile::types::{PaymentAttempt, PaymentState, RefundRequest};
use crate::reference::ReferenceStore;
use async_trait::async_trait;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentMethodKind {
    CreditCard,
}

impl PaymentMethodKind {
    pub fn identifier(&self) -> &'static str {
        match self {
            PaymentMethodKind::CreditCard => "authorizenet_creditcard",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentMethodKind::CreditCard => "Credit card",
        }
    }

    fn enabled_in(&self, config: &AuthorizeNetConfig) -> bool {
        match self {
            PaymentMethodKind::CreditCard => config.method_creditcard,
        }
    }
}

/// Capability interface consumed by the host's checkout and refund flows.
#[async_trait]
pub trait MethodProvider: Send + Sync {
    async fn execute(&self, attempt: &PaymentAttempt) -> ReconcileResult<()>;

    async fn refund(
        &self,
        refund: &RefundRequest,
        payment: &PaymentAttempt,
    ) -> ReconcileResult<()>;

    fn is_refund_supported(&self, payment: &PaymentAttempt) -> bool;

    fn is_partial_refund_supported(&self, payment: &PaymentAttempt) -> bool;

    fn is_enabled(&self) -> bool;

    fn identifier(&self) -> &'static str;
}

/// One configured payment method backed by the reconciliation engine.
pub struct AuthorizeNetMethod {
    kind: PaymentMethodKind,
    config: AuthorizeNetConfig,
    executor: TransactionExecutor,
    resolver: RefundResolver,
}

impl AuthorizeNetMethod {
    pub fn new(
        kind: PaymentMethodKind,
        config: AuthorizeNetConfig,
        gateway: Arc<dyn GatewayApi>,
        index: Arc<dyn ReferenceStore>,
        host: Arc<dyn OrderHost>,
    ) -> Self {
        let executor = TransactionExecutor::new(
            Arc::clone(&gateway),
            index,
            Arc::clone(&host),
            config.clone(),
        );
        let resolver = RefundResolver::new(gateway, host, config.clone());
        Self {
            kind,
            config,
            executor,
            resolver,
        }
    }
}

#[async_trait]
impl MethodProvider for AuthorizeNetMethod {
    async fn execute(&self, attempt: &PaymentAttempt) -> ReconcileResult<()> {
        self.executor.authorize_and_capture(attempt).await
    }

    async fn refund(
        &self,
        refund: &RefundRequest,
        payment: &PaymentAttempt,
    ) -> ReconcileResult<()> {
        self.resolver.refund(refund, payment).await
    }

    fn is_refund_supported(&self, payment: &PaymentAttempt) -> bool {
        // The gateway's real refund window is reportedly 90 days after
        // settlement, but no trustworthy documentation confirms it, so the
        // window is not enforced locally.
        payment.state == PaymentState::Confirmed
    }

    fn is_partial_refund_supported(&self, payment: &PaymentAttempt) -> bool {
        self.is_refund_supported(payment)
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && self.kind.enabled_in(&self.config)
    }

    fn identifier(&self) -> &'static str {
        self.kind.identifier()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_kind_identifiers() {
        assert_eq!(
            PaymentMethodKind::CreditCard.identifier(),
            "authorizenet_creditcard"
        );
        assert_eq!(PaymentMethodKind::CreditCard.display_name(), "Credit card");
    }
}
