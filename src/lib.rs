//! Reconciliation engine for the Authorize.Net card gateway.
//!
//! This crate keeps a merchant's local payment and refund records in step with
//! the gateway's eventually-consistent transaction state. It drives
//! authorize/capture calls, handles the refund-vs-void settlement split,
//! maintains the durable index that maps gateway transaction ids back to local
//! records, and applies signed webhook notifications exactly once.
//!
//! The hosting application owns orders, payments and refunds; it implements
//! [`reconcile::host::OrderHost`], registers an [`reconcile::provider::AuthorizeNetMethod`]
//! and mounts [`api::webhooks::webhook_router`] into its HTTP server.

pub mod api;
pub mod config;
pub mod gateway;
pub mod logging;
pub mod reconcile;
pub mod reference;
pub mod webhook;
