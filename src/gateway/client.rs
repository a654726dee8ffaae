//! HTTP client for the gateway's transaction API.

use crate::config::AuthorizeNetConfig;
use crate::gateway::types::{
    truncated, CreateTransactionRequest, MerchantAuthentication, TransactionRequest,
    INVOICE_NUMBER_MAX,
};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::Duration;
use tracing::{debug, warn};

/// HTTP-layer failures. Both variants mean the operation ended without a
/// definitive remote outcome and must surface to callers as retriable.
#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("gateway unreachable: {message}")]
    Unreachable { message: String },

    #[error("invalid gateway response: {message}")]
    InvalidResponse { message: String },
}

/// Outbound seam to the transaction API. The production implementation is
/// [`GatewayClient`]; tests drive the executors with mocks.
#[async_trait]
pub trait GatewayApi: Send + Sync {
    /// Dispatch one `createTransactionRequest` and return the decoded JSON
    /// body. `ref_id` is the local identifier, truncated to the gateway's
    /// 20-character limit before sending.
    async fn create_transaction(
        &self,
        ref_id: &str,
        request: TransactionRequest,
    ) -> Result<JsonValue, GatewayError>;
}

/// Stateless request/response wrapper around the gateway endpoint. Pure
/// mediation: builds the authenticated envelope, posts it, decodes the body.
pub struct GatewayClient {
    http: Client,
    api_url: String,
    auth: MerchantAuthentication,
}

impl GatewayClient {
    pub fn new(config: &AuthorizeNetConfig) -> Result<Self, GatewayError> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| GatewayError::Unreachable {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            api_url: config.environment.api_url().to_string(),
            auth: MerchantAuthentication {
                name: config.login_id.clone(),
                transaction_key: config.transaction_key.clone(),
            },
        })
    }
}

#[async_trait]
impl GatewayApi for GatewayClient {
    async fn create_transaction(
        &self,
        ref_id: &str,
        request: TransactionRequest,
    ) -> Result<JsonValue, GatewayError> {
        let envelope = CreateTransactionRequest {
            merchant_authentication: self.auth.clone(),
            ref_id: truncated(ref_id, INVOICE_NUMBER_MAX),
            transaction_request: request,
        }
        .envelope();

        debug!(ref_id = %ref_id, url = %self.api_url, "dispatching gateway transaction");

        let response = self
            .http
            .post(&self.api_url)
            .json(&envelope)
            .send()
            .await
            .map_err(|e| {
                warn!(ref_id = %ref_id, error = %e, "gateway request failed");
                GatewayError::Unreachable {
                    message: format!("gateway request failed: {}", e),
                }
            })?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| GatewayError::Unreachable {
                message: format!("failed to read gateway response: {}", e),
            })?;

        if !status.is_success() {
            warn!(ref_id = %ref_id, status = %status, "gateway returned error status");
            return Err(GatewayError::Unreachable {
                message: format!("HTTP {}", status),
            });
        }

        decode_response_body(&body)
    }
}

/// Decode a gateway response body. The gateway prefixes its JSON with a UTF-8
/// byte-order mark, which serde rejects, so it is stripped first.
pub fn decode_response_body(body: &[u8]) -> Result<JsonValue, GatewayError> {
    let body = strip_utf8_bom(body);
    serde_json::from_slice(body).map_err(|e| GatewayError::InvalidResponse {
        message: format!("undecodable gateway response: {}", e),
    })
}

fn strip_utf8_bom(body: &[u8]) -> &[u8] {
    body.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(body)
}
