//! Timestamped HMAC signature for webhook delivery.
//!
//! The receiving endpoint validates the signature against the same shared
//! secret: base64(HMAC-SHA256(secret, "<timestamp>\n<secret>")), with the
//! result percent-encoded for use as a query parameter.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Computes the `(timestamp, sign)` query-parameter pair for a fixed
/// millisecond timestamp.
pub fn sign(secret: &str, timestamp_ms: i64) -> (String, String) {
    let timestamp = timestamp_ms.to_string();
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(format!("{timestamp}\n{secret}").as_bytes());
    let signature = STANDARD.encode(mac.finalize().into_bytes());
    (timestamp, urlencoding::encode(&signature).into_owned())
}

/// Signs with the current time. The endpoint checks timestamp freshness, so
/// the pair must be generated per attempt and never reused.
pub fn sign_now(secret: &str) -> (String, String) {
    sign(secret, Utc::now().timestamp_millis())
}
