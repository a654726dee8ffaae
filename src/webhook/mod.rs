//! Ingestion of signed gateway webhook notifications.

pub mod ingestor;
pub mod signature;

pub use ingestor::{Disposition, WebhookEventType, WebhookIngestor};
pub use signature::signature_matches;
