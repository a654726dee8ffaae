//! Postgres-backed reference store.

use crate::config::DatabaseConfig;
use crate::reference::{IndexError, NewReference, ReferenceRecord, ReferenceStore};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::time::Duration;
use tracing::info;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS gateway_references (
    id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
    reference TEXT NOT NULL UNIQUE,
    order_code TEXT NOT NULL,
    payment_full_id TEXT NOT NULL,
    created_at TIMESTAMPTZ NOT NULL DEFAULT now()
);
CREATE INDEX IF NOT EXISTS gateway_references_order_code_idx
    ON gateway_references (order_code);
";

/// Postgres unique-violation SQLSTATE.
const UNIQUE_VIOLATION: &str = "23505";

pub struct PgReferenceStore {
    pool: PgPool,
}

impl PgReferenceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Open a connection pool from configuration.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, IndexError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .idle_timeout(config.idle_timeout.map(Duration::from_secs))
            .connect(&config.url)
            .await
            .map_err(storage_error)?;

        info!(
            max_connections = config.max_connections,
            "reference store pool initialized"
        );
        Ok(Self { pool })
    }

    /// Create the reference table if it does not exist yet.
    pub async fn ensure_schema(&self) -> Result<(), IndexError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn storage_error(err: sqlx::Error) -> IndexError {
    IndexError::Storage {
        message: err.to_string(),
    }
}

#[async_trait]
impl ReferenceStore for PgReferenceStore {
    async fn record(&self, entry: NewReference) -> Result<ReferenceRecord, IndexError> {
        sqlx::query_as::<_, ReferenceRecord>(
            "INSERT INTO gateway_references (reference, order_code, payment_full_id)
             VALUES ($1, $2, $3)
             RETURNING id, reference, order_code, payment_full_id, created_at",
        )
        .bind(&entry.reference)
        .bind(&entry.order_code)
        .bind(&entry.payment_full_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.code().as_deref() == Some(UNIQUE_VIOLATION) {
                    return IndexError::Duplicate {
                        reference: entry.reference.clone(),
                    };
                }
            }
            storage_error(e)
        })
    }

    async fn lookup_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ReferenceRecord>, IndexError> {
        sqlx::query_as::<_, ReferenceRecord>(
            "SELECT id, reference, order_code, payment_full_id, created_at
             FROM gateway_references
             WHERE reference = $1",
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn lookup_by_order_code(
        &self,
        order_code: &str,
    ) -> Result<Option<ReferenceRecord>, IndexError> {
        sqlx::query_as::<_, ReferenceRecord>(
            "SELECT id, reference, order_code, payment_full_id, created_at
             FROM gateway_references
             WHERE order_code = $1
             ORDER BY created_at DESC
             LIMIT 1",
        )
        .bind(order_code)
        .fetch_optional(&self.pool)
        .await
        .map_err(storage_error)
    }

    async fn remove_order(&self, order_code: &str) -> Result<u64, IndexError> {
        let result = sqlx::query("DELETE FROM gateway_references WHERE order_code = $1")
            .bind(order_code)
            .execute(&self.pool)
            .await
            .map_err(storage_error)?;
        Ok(result.rows_affected())
    }
}
