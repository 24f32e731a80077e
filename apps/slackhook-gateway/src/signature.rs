//! Slack request signing (`X-Slack-Signature`).

use axum::http::HeaderMap;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

pub const TIMESTAMP_HEADER: &str = "x-slack-request-timestamp";
pub const SIGNATURE_HEADER: &str = "x-slack-signature";

/// Requests older than this are treated as replays.
pub const MAX_SKEW_SECS: i64 = 60 * 5;

/// Verifies Slack's signed request using the signing secret.
///
/// ```
/// use axum::http::HeaderMap;
/// use slackhook_gateway::signature::verify_slack_sig;
///
/// let mut headers = HeaderMap::new();
/// headers.insert("x-slack-request-timestamp", "1".parse().unwrap());
/// headers.insert("x-slack-signature", "v0=deadbeef".parse().unwrap());
/// assert!(!verify_slack_sig("secret", &headers, b"{}", 1));
/// ```
pub fn verify_slack_sig(secret: &str, headers: &HeaderMap, body: &[u8], now: i64) -> bool {
    let timestamp = headers
        .get(TIMESTAMP_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");
    let signature = headers
        .get(SIGNATURE_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if timestamp.is_empty() || signature.is_empty() {
        return false;
    }
    match timestamp.parse::<i64>() {
        Ok(ts) if (now - ts).abs() <= MAX_SKEW_SECS => {}
        _ => return false,
    }

    let expected = sign(secret, timestamp, body);
    expected.as_bytes().ct_eq(signature.as_bytes()).into()
}

/// Computes the `v0=` signature Slack sends for `body`.
pub fn sign(secret: &str, timestamp: &str, body: &[u8]) -> String {
    // HMAC accepts keys of any length.
    let mut mac = match HmacSha256::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return String::new(),
    };
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    format!("v0={}", hex::encode(mac.finalize().into_bytes()))
}
