//! Request/response mediation for the Authorize.Net transaction API.

pub mod client;
pub mod types;

pub use client::{GatewayApi, GatewayClient, GatewayError};
pub use types::{
    CreateTransactionRequest, CreditCardRef, GatewayResponse, MerchantAuthentication, OpaqueData,
    OrderFields, TransactionRequest,
};
