//! The reconciliation core: payment execution, refund resolution, and the
//! collaborator contract towards the hosting application.

pub mod error;
pub mod executor;
pub mod host;
pub mod provider;
pub mod refund;
pub mod types;

pub use error::{ReconcileError, ReconcileResult};
pub use executor::TransactionExecutor;
pub use host::{HostError, OrderHost};
pub use provider::{AuthorizeNetMethod, MethodProvider, PaymentMethodKind};
pub use refund::RefundResolver;
pub use types::{PaymentAttempt, PaymentState, RefundRequest, RefundState};
