//! Common helper functions for HTTP handlers.
//!
//! Responses use the Lambda proxy shape (`statusCode` + string `body`); the
//! server entrypoint converts the same values into HTTP responses.

use chrono::Utc;
use serde_json::{Value, json};

/// Returns a 200 OK response with an empty JSON body.
#[must_use]
pub fn ok_empty() -> Value {
    json!({ "statusCode": 200, "body": "{}" })
}

/// Returns a 200 OK response with an ephemeral Slack message.
#[must_use]
pub fn ok_ephemeral(text: &str) -> Value {
    json_response(200, &json!({ "response_type": "ephemeral", "text": text }))
}

/// Returns an error response with the given status code and message.
#[must_use]
pub fn err_response(status_code: u16, message: &str) -> Value {
    json_response(status_code, &json!({ "error": message }))
}

/// Returns a JSON response with an arbitrary status.
#[must_use]
pub fn json_response(status_code: u16, body: &Value) -> Value {
    json!({
        "statusCode": status_code,
        "headers": { "Content-Type": "application/json" },
        "body": body.to_string()
    })
}

/// Liveness answer for `GET` on the command route.
#[must_use]
pub fn health() -> Value {
    json_response(200, &json!({ "ok": true, "ts": Utc::now().timestamp_millis() }))
}

#[must_use]
pub fn not_found(path: &str) -> Value {
    json_response(404, &json!({ "ok": false, "route": path }))
}

#[must_use]
pub fn method_not_allowed() -> Value {
    json!({ "statusCode": 405, "body": "Use POST" })
}

/// The status code of a proxy-shaped response, defaulting to 200.
#[must_use]
pub fn status_of(response: &Value) -> u16 {
    response
        .get("statusCode")
        .and_then(Value::as_u64)
        .and_then(|s| u16::try_from(s).ok())
        .unwrap_or(200)
}
