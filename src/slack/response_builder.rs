//! Response-related utilities for Slack interactions.
//!
//! This module provides standardized ways to create and format
//! responses sent to Slack.

use serde_json::{Value, json};

/// Create a JSON payload for an ephemeral response
///
/// Used both as the synchronous slash-command acknowledgment and as the body
/// of a `response_url` POST.
///
/// # Examples
///
/// ```
/// use slack_recap::slack::response_builder::create_ephemeral_payload;
///
/// let payload = create_ephemeral_payload("This message is only visible to you");
/// assert_eq!(payload["response_type"], "ephemeral");
/// ```
#[must_use]
pub fn create_ephemeral_payload(text: &str) -> Value {
    json!({
        "text": text,
        "response_type": "ephemeral"
    })
}

/// Create a `response_url` payload that replaces the acknowledgment message.
///
/// `in_channel` makes the replacement visible to everyone; `thread_ts`, when
/// given, places it in that thread.
#[must_use]
pub fn create_replace_original_payload(
    text: &str,
    in_channel: bool,
    thread_ts: Option<&str>,
) -> Value {
    let mut payload = json!({
        "replace_original": true,
        "response_type": if in_channel { "in_channel" } else { "ephemeral" },
        "text": text,
    });
    if let Some(ts) = thread_ts {
        payload["thread_ts"] = Value::String(ts.to_string());
    }
    payload
}
