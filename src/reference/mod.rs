//! Durable index mapping gateway transaction ids back to local records.
//!
//! A record is created exactly once, at the moment the gateway confirms a
//! payment attempt, and never mutated afterwards. Refunds and voids are never
//! indexed directly; they resolve transitively through the payment they
//! target.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

pub use memory::InMemoryReferenceStore;
pub use postgres::PgReferenceStore;

/// One durable index entry.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReferenceRecord {
    pub id: Uuid,
    /// Gateway transaction id; globally unique.
    pub reference: String,
    pub order_code: String,
    pub payment_full_id: String,
    pub created_at: DateTime<Utc>,
}

/// Input for [`ReferenceStore::record`].
#[derive(Debug, Clone)]
pub struct NewReference {
    pub reference: String,
    pub order_code: String,
    pub payment_full_id: String,
}

#[derive(Debug, Clone, Error)]
pub enum IndexError {
    #[error("reference already recorded: {reference}")]
    Duplicate { reference: String },

    #[error("reference index storage error: {message}")]
    Storage { message: String },
}

#[async_trait]
pub trait ReferenceStore: Send + Sync {
    /// Create an index entry. Fails with [`IndexError::Duplicate`] if the
    /// reference string already exists.
    async fn record(&self, entry: NewReference) -> Result<ReferenceRecord, IndexError>;

    /// Primary lookup by gateway transaction id.
    async fn lookup_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ReferenceRecord>, IndexError>;

    /// Best-effort fallback by order code. Imprecise: an order can carry
    /// several payment attempts. Kept only because refund notifications
    /// sometimes omit a resolvable transaction id.
    async fn lookup_by_order_code(
        &self,
        order_code: &str,
    ) -> Result<Option<ReferenceRecord>, IndexError>;

    /// Cascade hook: remove every entry owned by an order being deleted.
    async fn remove_order(&self, order_code: &str) -> Result<u64, IndexError>;
}
