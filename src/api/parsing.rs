use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde_json::Value;
use std::collections::HashMap;

use crate::errors::SlackError;

/// An inbound HTTP request, independent of how it reached us.
#[derive(Debug, Clone, Default)]
pub struct IncomingRequest {
    pub method: String,
    pub path: String,
    /// Keys are lowercased.
    pub headers: HashMap<String, String>,
    pub body: String,
}

impl IncomingRequest {
    #[must_use]
    pub fn new(method: &str, path: &str, body: &str) -> Self {
        Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            headers: HashMap::new(),
            body: body.to_string(),
        }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers
            .insert(name.to_ascii_lowercase(), value.to_string());
        self
    }

    #[must_use]
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    #[must_use]
    pub fn is_post(&self) -> bool {
        self.method == "POST"
    }

    /// Reads an API Gateway / function URL event (payload format 1.0 or 2.0).
    ///
    /// # Errors
    ///
    /// Returns a `ParseError` when a base64 body cannot be decoded.
    pub fn from_lambda_payload(payload: &Value) -> Result<Self, SlackError> {
        let method = v_str(payload, &["requestContext", "http", "method"])
            .or_else(|| v_str(payload, &["httpMethod"]))
            .unwrap_or("POST");
        let path = v_str(payload, &["rawPath"])
            .or_else(|| v_str(payload, &["path"]))
            .unwrap_or("");

        let headers = payload
            .get("headers")
            .and_then(Value::as_object)
            .map(|map| {
                map.iter()
                    .filter_map(|(k, v)| v.as_str().map(|s| (k.to_ascii_lowercase(), s.to_string())))
                    .collect()
            })
            .unwrap_or_default();

        let raw_body = payload.get("body").and_then(Value::as_str).unwrap_or("");
        let is_base64 = payload
            .get("isBase64Encoded")
            .and_then(Value::as_bool)
            .unwrap_or(false);
        let body = if is_base64 {
            let bytes = STANDARD
                .decode(raw_body)
                .map_err(|e| SlackError::ParseError(format!("Invalid base64 body: {e}")))?;
            String::from_utf8(bytes)
                .map_err(|e| SlackError::ParseError(format!("Body is not UTF-8: {e}")))?
        } else {
            raw_body.to_string()
        };

        Ok(Self {
            method: method.to_ascii_uppercase(),
            path: path.to_string(),
            headers,
            body,
        })
    }
}

pub fn v_path<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    let mut cur = root;
    for key in path {
        cur = cur.get(*key)?;
    }
    Some(cur)
}

pub fn v_str<'a>(root: &'a Value, path: &[&str]) -> Option<&'a str> {
    v_path(root, path).and_then(|v| v.as_str())
}
