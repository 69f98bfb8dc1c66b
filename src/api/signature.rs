use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::error;

/// Requests older than this are rejected as replays.
const MAX_AGE_SECS: u64 = 300;
/// Tolerated clock skew for timestamps from the future.
const MAX_SKEW_SECS: u64 = 60;

pub const SLACK_SIGNATURE_HEADER: &str = "X-Slack-Signature";
pub const SLACK_TIMESTAMP_HEADER: &str = "X-Slack-Request-Timestamp";
pub const RELAY_SIGNATURE_HEADER: &str = "X-Relay-Signature";
pub const RELAY_TIMESTAMP_HEADER: &str = "X-Relay-Timestamp";

fn mac_for(timestamp: &str, request_body: &str, secret: &str) -> Option<Hmac<Sha256>> {
    let mut mac = match Hmac::<Sha256>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(e) => {
            error!("Failed to create HMAC: {}", e);
            return None;
        }
    };
    mac.update(format!("v0:{timestamp}:{request_body}").as_bytes());
    Some(mac)
}

/// Checks a `v0=` HMAC-SHA256 signature over `v0:{timestamp}:{body}`.
///
/// Used for Slack requests and, with the same secret, for relay calls
/// from the API function to the worker.
pub fn verify_signature(request_body: &str, timestamp: &str, signature: &str, secret: &str) -> bool {
    let Ok(ts) = timestamp.trim().parse::<u64>() else {
        error!("Signature timestamp is not a number");
        return false;
    };
    let now_secs = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);
    if now_secs.saturating_sub(ts) > MAX_AGE_SECS || ts > now_secs + MAX_SKEW_SECS {
        error!("Timestamp out of range, potential replay attack");
        return false;
    }

    let Some(hex_sig) = signature.strip_prefix("v0=") else {
        error!("Signature is missing the v0= prefix");
        return false;
    };
    let Ok(expected) = hex::decode(hex_sig) else {
        error!("Signature is not valid hex");
        return false;
    };
    let Some(mac) = mac_for(timestamp, request_body, secret) else {
        return false;
    };

    if mac.verify_slice(&expected).is_ok() {
        true
    } else {
        error!("Signature verification failed");
        false
    }
}

pub fn compute_signature(timestamp: &str, request_body: &str, secret: &str) -> String {
    match mac_for(timestamp, request_body, secret) {
        Some(mac) => format!("v0={}", hex::encode(mac.finalize().into_bytes())),
        None => String::new(),
    }
}
