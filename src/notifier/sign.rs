//! Request signatures for the robot webhooks.
//!
//! Both providers use base64-encoded HMAC-SHA256, but they arrange key and
//! message differently. Keep each function exactly as its provider expects.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn hmac_sha256(key: &[u8], message: &[u8]) -> Vec<u8> {
    let mut mac = match HmacSha256::new_from_slice(key) {
        Ok(mac) => mac,
        Err(_) => unreachable!("hmac accepts keys of any length"),
    };
    mac.update(message);
    mac.finalize().into_bytes().to_vec()
}

/// DingTalk: key = secret, message = "{timestamp}\n{secret}". The timestamp
/// is in milliseconds. The result still needs URL encoding before it goes
/// into the query string.
pub fn dingtalk(secret: &str, timestamp_ms: i64) -> String {
    let string_to_sign = format!("{}\n{}", timestamp_ms, secret);
    STANDARD.encode(hmac_sha256(secret.as_bytes(), string_to_sign.as_bytes()))
}

/// Feishu: key = "{timestamp}\n{secret}", empty message. The timestamp is
/// in seconds.
pub fn feishu(secret: &str, timestamp_s: i64) -> String {
    let string_to_sign = format!("{}\n{}", timestamp_s, secret);
    STANDARD.encode(hmac_sha256(string_to_sign.as_bytes(), b""))
}
