//! Reversible obfuscation for sensitive configuration values.
//!
//! This is base64, not encryption: it only keeps the webhook secret out of
//! casual view in the settings table. A deployment that needs real
//! confidentiality should wrap the value in authenticated encryption with a
//! server-held key instead; that is a policy decision left to the operator.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;

pub fn encode(plaintext: &str) -> String {
    if plaintext.is_empty() {
        return String::new();
    }
    STANDARD.encode(plaintext)
}

/// Decodes a stored value. Malformed or non-UTF8 input is returned unchanged
/// rather than treated as an error, so a value that was stored before
/// encoding was introduced still round-trips. Callers cannot distinguish
/// "decoded" from "passed through".
pub fn decode(token: &str) -> String {
    if token.is_empty() {
        return String::new();
    }
    match STANDARD.decode(token) {
        Ok(bytes) => String::from_utf8(bytes).unwrap_or_else(|_| token.to_owned()),
        Err(_) => token.to_owned(),
    }
}
