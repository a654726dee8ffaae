//! Shared fixtures and mock collaborators for the integration tests.
#![allow(dead_code)]

use async_trait::async_trait;
use authnet_reconcile::config::{AuthorizeNetConfig, GatewayEnvironment};
use authnet_reconcile::gateway::{GatewayApi, GatewayError, TransactionRequest};
use authnet_reconcile::reconcile::host::{HostError, OrderHost};
use authnet_reconcile::reconcile::types::{
    PaymentAttempt, PaymentState, RefundRequest, RefundState,
};
use bigdecimal::BigDecimal;
use hmac::{Hmac, Mac};
use serde_json::{json, Value as JsonValue};
use sha2::Sha512;
use std::collections::{HashMap, VecDeque};
use std::str::FromStr;
use std::sync::Mutex;

pub const SIGNATURE_KEY: &str = "webhook-signature-key";

pub fn gateway_config() -> AuthorizeNetConfig {
    AuthorizeNetConfig {
        environment: GatewayEnvironment::Sandbox,
        login_id: "login".to_string(),
        transaction_key: "txkey".to_string(),
        signature_key: SIGNATURE_KEY.to_string(),
        public_client_key: "pubkey".to_string(),
        event_label: "DemoCon".to_string(),
        enabled: true,
        method_creditcard: true,
        request_timeout_secs: 30,
    }
}

/// Sign a webhook body the way the gateway does.
pub fn sign_body(body: &[u8], key: &str) -> String {
    let mut mac =
        Hmac::<Sha512>::new_from_slice(key.as_bytes()).expect("hmac accepts any key length");
    mac.update(body);
    format!("sha512={}", hex::encode_upper(mac.finalize().into_bytes()))
}

pub fn amount(value: &str) -> BigDecimal {
    BigDecimal::from_str(value).expect("valid test amount")
}

/// A fresh attempt holding a captured token, ready for authorize/capture.
pub fn new_attempt() -> PaymentAttempt {
    PaymentAttempt {
        full_id: "ABC12-P-1".to_string(),
        order_code: "ABC12".to_string(),
        amount: amount("9.60"),
        currency: "USD".to_string(),
        token: Some(authnet_reconcile::gateway::OpaqueData {
            data_descriptor: "COMMON.ACCEPT.INAPP.PAYMENT".to_string(),
            data_value: "d1v1token".to_string(),
        }),
        state: PaymentState::Created,
        info: None,
        refunded_amount: amount("0"),
        shredded: false,
    }
}

/// A confirmed attempt carrying the stored gateway response a refund needs.
pub fn confirmed_attempt() -> PaymentAttempt {
    PaymentAttempt {
        state: PaymentState::Confirmed,
        token: None,
        info: Some(json!({
            "transactionResponse": {
                "responseCode": "1",
                "transId": "40098176700",
                "accountNumber": "XXXX1111",
                "accountType": "Visa"
            },
            "messages": {"resultCode": "Ok", "message": []}
        })),
        ..new_attempt()
    }
}

pub fn refund_request(amount_str: &str) -> RefundRequest {
    RefundRequest {
        full_id: "ABC12-R-1".to_string(),
        local_id: 1,
        order_code: "ABC12".to_string(),
        payment_full_id: "ABC12-P-1".to_string(),
        amount: amount(amount_str),
        state: RefundState::Created,
        info: None,
    }
}

pub fn approved_auth_response(trans_id: &str) -> JsonValue {
    json!({
        "transactionResponse": {
            "responseCode": "1",
            "authCode": "ZXY987",
            "transId": trans_id,
            "networkTransId": "NET123",
            "accountNumber": "XXXX1111",
            "accountType": "Visa",
            "messages": [{"code": "1", "description": "This transaction has been approved."}]
        },
        "messages": {
            "resultCode": "Ok",
            "message": [{"code": "I00001", "text": "Successful."}]
        }
    })
}

pub fn declined_response() -> JsonValue {
    json!({
        "transactionResponse": {
            "responseCode": "2",
            "transId": "0",
            "errors": [{"errorCode": "2", "errorText": "This transaction has been declined."}]
        },
        "messages": {
            "resultCode": "Ok",
            "message": [{"code": "I00001", "text": "Successful."}]
        }
    })
}

pub fn settlement_pending_response() -> JsonValue {
    json!({
        "transactionResponse": {
            "responseCode": "3",
            "transId": "0",
            "errors": [{
                "errorCode": "54",
                "errorText": "The referenced transaction does not meet the criteria for issuing a credit."
            }]
        },
        "messages": {
            "resultCode": "Error",
            "message": [{"code": "E00027", "text": "The transaction was unsuccessful."}]
        }
    })
}

pub fn approved_void_response(trans_id: &str) -> JsonValue {
    json!({
        "transactionResponse": {
            "responseCode": "1",
            "transId": trans_id,
            "messages": [{"code": "1", "description": "This transaction has been approved."}]
        },
        "messages": {
            "resultCode": "Ok",
            "message": [{"code": "I00001", "text": "Successful."}]
        }
    })
}

/// Scripted gateway: answers from a queue and records every dispatched
/// request as serialized JSON.
pub struct MockGateway {
    responses: Mutex<VecDeque<Result<JsonValue, GatewayError>>>,
    calls: Mutex<Vec<(String, JsonValue)>>,
}

impl MockGateway {
    pub fn new(responses: Vec<Result<JsonValue, GatewayError>>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, JsonValue)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GatewayApi for MockGateway {
    async fn create_transaction(
        &self,
        ref_id: &str,
        request: TransactionRequest,
    ) -> Result<JsonValue, GatewayError> {
        self.calls.lock().unwrap().push((
            ref_id.to_string(),
            serde_json::to_value(&request).expect("request serializes"),
        ));
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(GatewayError::Unreachable {
                    message: "no scripted response left".to_string(),
                })
            })
    }
}

/// In-memory host that tracks payment and refund state transitions the way
/// the real hosting application would.
#[derive(Default)]
pub struct MockHost {
    pub payments: Mutex<HashMap<String, PaymentAttempt>>,
    pub refunds: Mutex<HashMap<String, RefundRequest>>,
    /// (payment_full_id, amount, gateway reference)
    pub external_refunds: Mutex<Vec<(String, BigDecimal, String)>>,
    /// (order_code, action, data)
    pub actions: Mutex<Vec<(String, String, JsonValue)>>,
}

impl MockHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_payment(payment: PaymentAttempt) -> Self {
        let host = Self::default();
        host.insert_payment(payment);
        host
    }

    pub fn insert_payment(&self, payment: PaymentAttempt) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.full_id.clone(), payment);
    }

    pub fn insert_refund(&self, refund: RefundRequest) {
        self.refunds
            .lock()
            .unwrap()
            .insert(refund.full_id.clone(), refund);
    }

    pub fn payment(&self, full_id: &str) -> PaymentAttempt {
        self.payments
            .lock()
            .unwrap()
            .get(full_id)
            .cloned()
            .expect("payment exists")
    }

    pub fn refund(&self, full_id: &str) -> RefundRequest {
        self.refunds
            .lock()
            .unwrap()
            .get(full_id)
            .cloned()
            .expect("refund exists")
    }

    pub fn external_refund_count(&self) -> usize {
        self.external_refunds.lock().unwrap().len()
    }

    pub fn actions_named(&self, action: &str) -> Vec<JsonValue> {
        self.actions
            .lock()
            .unwrap()
            .iter()
            .filter(|(_, name, _)| name == action)
            .map(|(_, _, data)| data.clone())
            .collect()
    }
}

#[async_trait]
impl OrderHost for MockHost {
    async fn confirm_payment(
        &self,
        payment: &PaymentAttempt,
        info: JsonValue,
    ) -> Result<(), HostError> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(row) = payments.get_mut(&payment.full_id) {
            row.state = PaymentState::Confirmed;
            row.info = Some(info);
        }
        Ok(())
    }

    async fn fail_payment(
        &self,
        payment: &PaymentAttempt,
        info: Option<JsonValue>,
        _log_message: &str,
    ) -> Result<bool, HostError> {
        let mut payments = self.payments.lock().unwrap();
        let Some(row) = payments.get_mut(&payment.full_id) else {
            return Ok(false);
        };
        // Concluded states cannot be re-failed.
        if matches!(row.state, PaymentState::Refunded | PaymentState::Canceled) {
            return Ok(false);
        }
        row.state = PaymentState::Failed;
        if let Some(info) = info {
            row.info = Some(info);
        }
        Ok(true)
    }

    async fn record_payment_info(
        &self,
        payment: &PaymentAttempt,
        info: JsonValue,
    ) -> Result<(), HostError> {
        let mut payments = self.payments.lock().unwrap();
        if let Some(row) = payments.get_mut(&payment.full_id) {
            row.info = Some(info);
        }
        Ok(())
    }

    async fn refund_done(&self, refund: &RefundRequest, info: JsonValue) -> Result<(), HostError> {
        let mut refunds = self.refunds.lock().unwrap();
        if let Some(row) = refunds.get_mut(&refund.full_id) {
            row.state = RefundState::Done;
            row.info = Some(info);
        }
        let mut payments = self.payments.lock().unwrap();
        if let Some(row) = payments.get_mut(&refund.payment_full_id) {
            row.refunded_amount = &row.refunded_amount + &refund.amount;
            if row.refunded_amount >= row.amount {
                row.state = PaymentState::Refunded;
            }
        }
        Ok(())
    }

    async fn fail_refund(
        &self,
        refund: &RefundRequest,
        info: JsonValue,
        _log_message: &str,
    ) -> Result<(), HostError> {
        let mut refunds = self.refunds.lock().unwrap();
        if let Some(row) = refunds.get_mut(&refund.full_id) {
            row.state = RefundState::Failed;
            row.info = Some(info);
        }
        Ok(())
    }

    async fn create_external_refund(
        &self,
        payment: &PaymentAttempt,
        amount: BigDecimal,
        reference: &str,
        _info: JsonValue,
    ) -> Result<(), HostError> {
        let mut external = self.external_refunds.lock().unwrap();
        if external.iter().any(|(_, _, r)| r == reference) {
            return Err(HostError::DuplicateExternalRefund {
                reference: reference.to_string(),
            });
        }
        external.push((payment.full_id.clone(), amount.clone(), reference.to_string()));

        let mut payments = self.payments.lock().unwrap();
        if let Some(row) = payments.get_mut(&payment.full_id) {
            row.refunded_amount = &row.refunded_amount + &amount;
            if row.refunded_amount >= row.amount {
                row.state = PaymentState::Refunded;
            }
        }
        Ok(())
    }

    async fn log_action(
        &self,
        order_code: &str,
        action: &str,
        data: JsonValue,
    ) -> Result<(), HostError> {
        self.actions
            .lock()
            .unwrap()
            .push((order_code.to_string(), action.to_string(), data));
        Ok(())
    }

    async fn payment_by_full_id(
        &self,
        full_id: &str,
    ) -> Result<Option<PaymentAttempt>, HostError> {
        Ok(self.payments.lock().unwrap().get(full_id).cloned())
    }

    async fn refund_by_invoice(
        &self,
        order_code: &str,
        local_id: u32,
    ) -> Result<Option<RefundRequest>, HostError> {
        Ok(self
            .refunds
            .lock()
            .unwrap()
            .values()
            .find(|r| r.order_code == order_code && r.local_id == local_id)
            .cloned())
    }
}
