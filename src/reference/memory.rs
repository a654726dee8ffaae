//! In-memory reference store for tests and single-process embedding.

use crate::reference::{IndexError, NewReference, ReferenceRecord, ReferenceStore};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Mutex;
use uuid::Uuid;

#[derive(Default)]
pub struct InMemoryReferenceStore {
    rows: Mutex<Vec<ReferenceRecord>>,
}

impl InMemoryReferenceStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().expect("reference store lock").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReferenceStore for InMemoryReferenceStore {
    async fn record(&self, entry: NewReference) -> Result<ReferenceRecord, IndexError> {
        let mut rows = self.rows.lock().expect("reference store lock");
        if rows.iter().any(|r| r.reference == entry.reference) {
            return Err(IndexError::Duplicate {
                reference: entry.reference,
            });
        }
        let record = ReferenceRecord {
            id: Uuid::new_v4(),
            reference: entry.reference,
            order_code: entry.order_code,
            payment_full_id: entry.payment_full_id,
            created_at: Utc::now(),
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn lookup_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<ReferenceRecord>, IndexError> {
        let rows = self.rows.lock().expect("reference store lock");
        Ok(rows.iter().find(|r| r.reference == reference).cloned())
    }

    async fn lookup_by_order_code(
        &self,
        order_code: &str,
    ) -> Result<Option<ReferenceRecord>, IndexError> {
        let rows = self.rows.lock().expect("reference store lock");
        Ok(rows
            .iter()
            .rev()
            .find(|r| r.order_code == order_code)
            .cloned())
    }

    async fn remove_order(&self, order_code: &str) -> Result<u64, IndexError> {
        let mut rows = self.rows.lock().expect("reference store lock");
        let before = rows.len();
        rows.retain(|r| r.order_code != order_code);
        Ok((before - rows.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(reference: &str, order_code: &str, payment: &str) -> NewReference {
        NewReference {
            reference: reference.to_string(),
            order_code: order_code.to_string(),
            payment_full_id: payment.to_string(),
        }
    }

    #[tokio::test]
    async fn record_is_create_once() {
        let store = InMemoryReferenceStore::new();
        store
            .record(entry("40098176700", "ABC12", "ABC12-P-1"))
            .await
            .expect("first record should succeed");

        let duplicate = store
            .record(entry("40098176700", "XYZ99", "XYZ99-P-1"))
            .await;
        assert!(matches!(
            duplicate,
            Err(IndexError::Duplicate { reference }) if reference == "40098176700"
        ));
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn lookups_by_reference_and_order_code() {
        let store = InMemoryReferenceStore::new();
        store
            .record(entry("40098176700", "ABC12", "ABC12-P-1"))
            .await
            .unwrap();
        store
            .record(entry("40098176701", "ABC12", "ABC12-P-2"))
            .await
            .unwrap();

        let direct = store
            .lookup_by_reference("40098176700")
            .await
            .unwrap()
            .expect("direct lookup should hit");
        assert_eq!(direct.payment_full_id, "ABC12-P-1");

        // Fallback resolves to the most recent attempt for the order.
        let fallback = store
            .lookup_by_order_code("ABC12")
            .await
            .unwrap()
            .expect("fallback lookup should hit");
        assert_eq!(fallback.payment_full_id, "ABC12-P-2");

        assert!(store.lookup_by_reference("0").await.unwrap().is_none());
        assert!(store.lookup_by_order_code("NOPE").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn remove_order_cascades() {
        let store = InMemoryReferenceStore::new();
        store
            .record(entry("40098176700", "ABC12", "ABC12-P-1"))
            .await
            .unwrap();
        store
            .record(entry("40098176701", "XYZ99", "XYZ99-P-1"))
            .await
            .unwrap();

        assert_eq!(store.remove_order("ABC12").await.unwrap(), 1);
        assert_eq!(store.len(), 1);
        assert!(store
            .lookup_by_reference("40098176700")
            .await
            .unwrap()
            .is_none());
    }
}
