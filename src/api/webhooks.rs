//! Webhook HTTP endpoint.
//!
//! The gateway deactivates a webhook subscription after repeated non-2xx
//! responses, so this handler answers 200 for every request it can read and
//! puts the actual outcome in the response body and the logs.

use crate::webhook::WebhookIngestor;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::post;
use axum::Router;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::debug;

pub const SIGNATURE_HEADER: &str = "x-anet-signature";

/// Build the webhook router. Hosts nest or merge this into their own app.
pub fn webhook_router(ingestor: Arc<WebhookIngestor>) -> Router {
    Router::new()
        .route("/webhooks/authorizenet", post(handle_notification))
        .layer(TraceLayer::new_for_http())
        .with_state(ingestor)
}

async fn handle_notification(
    State(ingestor): State<Arc<WebhookIngestor>>,
    headers: HeaderMap,
    body: Bytes,
) -> impl IntoResponse {
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok());

    let disposition = ingestor.ingest(&body, signature).await;
    debug!(?disposition, "webhook acknowledged");
    (StatusCode::OK, disposition.body())
}
