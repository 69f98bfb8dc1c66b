//! OpenAI-compatible chat completions client
//!
//! Both backends speak the same `POST {base}/chat/completions` contract, so a
//! single client serves whichever one `ProviderConfig` selects.

use async_trait::async_trait;
use openai_api_rs::v1::chat_completion::{ChatCompletionMessage, Content, MessageRole};
use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue};
use serde::Deserialize;
use serde_json::{Value, json};
use std::time::Duration;
use tracing::{debug, info};

use super::provider::{
    CompletionChoice, CompletionProvider, CompletionRequest, CompletionResponse, ProviderConfig,
};
use crate::errors::SlackError;

/// Transport-level ceiling. The summarizer races a much shorter timer; this
/// only keeps abandoned connections from lingering.
const HTTP_TIMEOUT: Duration = Duration::from_secs(120);

#[derive(Debug, Deserialize)]
struct ChatCompletionsBody {
    #[serde(default)]
    choices: Vec<ChatChoice>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: Option<ChatChoiceMessage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: Option<String>,
}

/// LLM API client for generating summaries
#[derive(Clone)]
pub struct LlmClient {
    http: Client,
}

impl LlmClient {
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new() -> Result<Self, SlackError> {
        let http = Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| SlackError::HttpError(format!("Failed to build provider HTTP client: {e}")))?;
        Ok(Self { http })
    }

    #[must_use]
    pub fn with_http(http: Client) -> Self {
        Self { http }
    }

    #[must_use]
    pub fn build_messages(prompt: &str) -> Vec<ChatCompletionMessage> {
        vec![ChatCompletionMessage {
            role: MessageRole::user,
            content: Content::Text(prompt.to_string()),
            name: None,
            tool_calls: None,
            tool_call_id: None,
        }]
    }

    fn headers(api_key: &str) -> Result<HeaderMap, SlackError> {
        let mut headers = HeaderMap::new();
        let auth_value = HeaderValue::from_str(&format!("Bearer {api_key}"))
            .map_err(|e| SlackError::HttpError(format!("Invalid Authorization header: {e}")))?;
        headers.insert(AUTHORIZATION, auth_value);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        Ok(headers)
    }
}

#[async_trait]
impl CompletionProvider for LlmClient {
    async fn create_completion(
        &self,
        config: &ProviderConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, SlackError> {
        let messages = LlmClient::build_messages(&request.prompt);
        let body = json!({
            "model": request.model,
            "messages": messages_to_json(&messages),
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        info!(
            provider = config.kind.as_str(),
            model = %request.model,
            prompt_chars = request.prompt.chars().count(),
            "Requesting chat completion"
        );
        #[cfg(feature = "debug-logs")]
        debug!("Provider prompt:\n{}", request.prompt);

        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let response = self
            .http
            .post(url)
            .headers(LlmClient::headers(&config.api_key)?)
            .json(&body)
            .send()
            .await
            .map_err(|e| SlackError::HttpError(format!("Provider request failed: {e}")))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            SlackError::HttpError(format!("Failed to read provider response (status {status}): {e}"))
        })?;
        let parsed: Option<ChatCompletionsBody> = serde_json::from_str(&text).ok();

        if !status.is_success() {
            let detail = parsed
                .and_then(|b| b.error)
                .and_then(|e| e.message)
                .unwrap_or_else(|| text.chars().take(200).collect());
            return Err(SlackError::ProviderError(format!("HTTP {status}: {detail}")));
        }

        let body = parsed.ok_or_else(|| {
            SlackError::ProviderError("Malformed chat completion response".to_string())
        })?;
        if let Some(message) = body.error.and_then(|e| e.message) {
            return Err(SlackError::ProviderError(message));
        }

        debug!(choices = body.choices.len(), "Chat completion received");
        Ok(CompletionResponse {
            choices: body
                .choices
                .into_iter()
                .map(|c| CompletionChoice {
                    content: c.message.and_then(|m| m.content),
                })
                .collect(),
        })
    }
}

pub(crate) fn messages_to_json(messages: &[ChatCompletionMessage]) -> Vec<Value> {
    messages
        .iter()
        .filter_map(|m| {
            let role = match m.role {
                MessageRole::system => "system",
                MessageRole::user | MessageRole::function | MessageRole::tool => "user",
                MessageRole::assistant => "assistant",
            };
            match &m.content {
                Content::Text(t) => Some(json!({ "role": role, "content": t })),
                Content::ImageUrl(_) => None,
            }
        })
        .collect()
}
