//! Webhook signature verification.
//!
//! The gateway signs each notification with HMAC-SHA512 over the raw request
//! body and sends the uppercase hex digest in an `X-Anet-Signature` header of
//! the form `sha512=<hex>`.

use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Check a notification's signature header against the raw body.
///
/// The digest is taken from the suffix after the header's final `=` and
/// compared case-insensitively (as uppercase hex) in constant time.
pub fn signature_matches(raw_body: &[u8], signature_header: &str, signature_key: &str) -> bool {
    let received = signature_header
        .rsplit('=')
        .next()
        .unwrap_or("")
        .trim()
        .to_uppercase();
    if received.is_empty() {
        return false;
    }

    let mut mac = match HmacSha512::new_from_slice(signature_key.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(raw_body);
    let computed = hex::encode_upper(mac.finalize().into_bytes());

    secure_eq(computed.as_bytes(), received.as_bytes())
}

fn secure_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter()
        .zip(b.iter())
        .fold(0_u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
