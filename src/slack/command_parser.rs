use chrono::Utc;
use percent_encoding::percent_decode_str;
use std::collections::HashMap;

use crate::core::models::CommandInvocation;
use crate::errors::SlackError;

/// Decodes one `application/x-www-form-urlencoded` component.
///
/// # Examples
///
/// ```
/// use slack_recap::slack::command_parser::decode_url_component;
///
/// assert_eq!(decode_url_component("hello%20world").unwrap(), "hello world");
/// assert_eq!(decode_url_component("hello+world").unwrap(), "hello world");
/// assert_eq!(decode_url_component("1%2B1").unwrap(), "1+1");
/// ```
pub fn decode_url_component(input: &str) -> Result<String, String> {
    let spaced = input.replace('+', " ");
    percent_decode_str(&spaced)
        .decode_utf8()
        .map(|s| s.to_string())
        .map_err(|e| format!("Failed to decode URL component: {}", e))
}

/// Splits a form body into decoded key/value pairs. Later keys win.
pub fn parse_form_pairs(form_data: &str) -> Result<HashMap<String, String>, String> {
    let mut map = HashMap::new();
    for pair in form_data.split('&').filter(|p| !p.is_empty()) {
        let (raw_key, raw_value) = pair.split_once('=').unwrap_or((pair, ""));
        let key = decode_url_component(raw_key).map_err(|e| format!("Failed to decode key: {}", e))?;
        let value =
            decode_url_component(raw_value).map_err(|e| format!("Failed to decode value: {}", e))?;
        map.insert(key, value);
    }
    Ok(map)
}

/// Parses a slash-command body into a `CommandInvocation`.
///
/// `channel_id` and `user_id` are required; everything else is optional.
///
/// # Examples
///
/// ```
/// use slack_recap::slack::command_parser::parse_command;
///
/// let form_data = "channel_id=C123&user_id=U123&command=%2Fsummarize&text=&\
///                  response_url=https%3A%2F%2Fhooks.slack.com%2Fx&trigger_id=123.456";
///
/// let invocation = parse_command(form_data).unwrap();
/// assert_eq!(invocation.command, "/summarize");
/// assert_eq!(invocation.response_url.as_deref(), Some("https://hooks.slack.com/x"));
/// ```
pub fn parse_command(form_data: &str) -> Result<CommandInvocation, SlackError> {
    let mut map = parse_form_pairs(form_data).map_err(SlackError::ParseError)?;
    let mut take = |key: &str| map.remove(key).filter(|v| !v.trim().is_empty());

    let channel_id =
        take("channel_id").ok_or_else(|| SlackError::ParseError("missing channel_id".to_string()))?;
    let user_id =
        take("user_id").ok_or_else(|| SlackError::ParseError("missing user_id".to_string()))?;

    Ok(CommandInvocation {
        channel_id,
        user_id,
        thread_ts: take("thread_ts"),
        trigger_id: take("trigger_id").unwrap_or_default(),
        response_url: take("response_url"),
        command: take("command").unwrap_or_default(),
        text: take("text").unwrap_or_default(),
        received_at: Utc::now(),
    })
}
