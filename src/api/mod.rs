//! HTTP surface for embedding hosts.

pub mod webhooks;

pub use webhooks::webhook_router;
