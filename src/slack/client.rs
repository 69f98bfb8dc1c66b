//! Slack API client module
//!
//! Encapsulates the Slack Web API calls the relay and worker make.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{Value, json};
use slack_morphism::hyper_tokio::{SlackClientHyperConnector, SlackHyperClient};
use slack_morphism::prelude::{
    SlackApiChatPostEphemeralRequest, SlackApiChatPostMessageRequest,
    SlackApiConversationsHistoryRequest, SlackApiConversationsRepliesRequest,
};
use slack_morphism::{
    SlackApiToken, SlackApiTokenValue, SlackChannelId, SlackHistoryMessage, SlackMessageContent,
    SlackTs, SlackUserId,
};
use std::time::Duration;
use tokio_retry::strategy::{ExponentialBackoff, jitter};
use tokio_retry::Retry;
use tracing::{debug, warn};

use super::transport::ChatTransport;
use crate::core::config::DEFAULT_SLACK_API_BASE;
use crate::core::models::{HistoryMessage, HistoryQuery};
use crate::errors::SlackError;

// Build the Slack client connector safely without panicking.
// If connector construction fails, store None and surface a SlackError at call sites.
static SLACK_CLIENT: std::sync::LazyLock<Option<SlackHyperClient>> =
    std::sync::LazyLock::new(|| match SlackClientHyperConnector::new() {
        Ok(connector) => Some(SlackHyperClient::new(connector)),
        Err(e) => {
            warn!("Failed to create Slack HTTP connector: {}", e);
            None
        }
    });

static HTTP_CLIENT: std::sync::LazyLock<Client> = std::sync::LazyLock::new(|| {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap_or_else(|_| Client::new())
});

#[derive(Debug, Deserialize)]
struct SlackOkResponse {
    ok: bool,
    error: Option<String>,
}

/// Slack API client with retry logic for idempotent calls
pub struct SlackClient {
    token: SlackApiToken,
    api_base: String,
}

impl SlackClient {
    #[must_use]
    pub fn new(token: String) -> Self {
        Self::with_api_base(token, DEFAULT_SLACK_API_BASE.to_string())
    }

    /// Client whose raw HTTP calls go to `api_base` instead of `https://slack.com/api`.
    #[must_use]
    pub fn with_api_base(token: String, api_base: String) -> Self {
        Self {
            token: SlackApiToken::new(SlackApiTokenValue::new(token)),
            api_base: api_base.trim_end_matches('/').to_string(),
        }
    }

    #[must_use]
    pub fn token(&self) -> &SlackApiToken {
        &self.token
    }

    // chat.update and response_url replacements are idempotent, so they may be repeated.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> Result<T, SlackError>
    where
        F: FnMut() -> Fut + Send,
        Fut: std::future::Future<Output = Result<T, SlackError>> + Send,
        T: Send,
    {
        let strategy = ExponentialBackoff::from_millis(2)
            .factor(50)
            .max_delay(Duration::from_secs(2))
            .map(jitter)
            .take(3);

        Retry::spawn(strategy, operation).await
    }

    fn session_client() -> Result<&'static SlackHyperClient, SlackError> {
        SLACK_CLIENT.as_ref().ok_or_else(|| {
            SlackError::ApiError("Slack HTTP connector not initialized".to_string())
        })
    }

    async fn post_api(&self, method: &str, payload: &Value) -> Result<(), SlackError> {
        let resp = HTTP_CLIENT
            .post(format!("{}/{method}", self.api_base))
            .bearer_auth(&self.token.token_value.0)
            .json(payload)
            .send()
            .await
            .map_err(|e| SlackError::HttpError(format!("{method} request failed: {e}")))?;

        if !resp.status().is_success() {
            return Err(SlackError::ApiError(format!(
                "{method} HTTP {}",
                resp.status()
            )));
        }

        let body: SlackOkResponse = resp
            .json()
            .await
            .map_err(|e| SlackError::ParseError(format!("{method} JSON parse error: {e}")))?;

        if !body.ok {
            return Err(SlackError::ApiError(format!(
                "{method} error: {}",
                body.error.as_deref().unwrap_or("unknown")
            )));
        }

        Ok(())
    }
}

fn to_history_message(msg: SlackHistoryMessage) -> HistoryMessage {
    let subtype = msg.subtype.as_ref().and_then(|st| {
        serde_json::to_value(st)
            .ok()
            .and_then(|v| v.as_str().map(ToString::to_string))
            .or_else(|| Some(format!("{st:?}")))
    });
    HistoryMessage {
        ts: msg.origin.ts.0,
        user: msg.sender.user.map(|u| u.0),
        text: msg.content.text,
        subtype,
    }
}

#[async_trait]
impl ChatTransport for SlackClient {
    async fn post_placeholder(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<String, SlackError> {
        let session = Self::session_client()?.open_session(&self.token);

        let mut post_req = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        if let Some(ts) = thread_ts {
            post_req = post_req.with_thread_ts(SlackTs(ts.to_string()));
        }

        let resp = session.chat_post_message(&post_req).await?;
        Ok(resp.ts.0)
    }

    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), SlackError> {
        let session = Self::session_client()?.open_session(&self.token);

        let mut req = SlackApiChatPostEphemeralRequest::new(
            SlackChannelId(channel.to_string()),
            SlackUserId(user.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        if let Some(ts) = thread_ts {
            req = req.with_thread_ts(SlackTs(ts.to_string()));
        }

        session.chat_post_ephemeral(&req).await?;
        Ok(())
    }

    async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryMessage>, SlackError> {
        let session = Self::session_client()?.open_session(&self.token);
        let channel = SlackChannelId(query.channel.clone());
        let oldest = SlackTs(query.oldest.to_string());

        let messages = if let Some(thread_ts) = &query.thread_ts {
            let request = SlackApiConversationsRepliesRequest::new(channel, SlackTs(thread_ts.clone()))
                .with_limit(query.limit)
                .with_oldest(oldest);
            session.conversations_replies(&request).await?.messages
        } else {
            let request = SlackApiConversationsHistoryRequest::new()
                .with_channel(channel)
                .with_limit(query.limit)
                .with_oldest(oldest);
            session.conversations_history(&request).await?.messages
        };

        debug!(
            channel = %query.channel,
            count = messages.len(),
            "Fetched conversation messages"
        );
        Ok(messages.into_iter().map(to_history_message).collect())
    }

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), SlackError> {
        let session = Self::session_client()?.open_session(&self.token);

        let mut post_req = SlackApiChatPostMessageRequest::new(
            SlackChannelId(channel.to_string()),
            SlackMessageContent::new().with_text(text.to_string()),
        );
        if let Some(ts) = thread_ts {
            post_req = post_req.with_thread_ts(SlackTs(ts.to_string()));
        }

        session.chat_post_message(&post_req).await?;
        Ok(())
    }

    async fn update_message(&self, channel: &str, ts: &str, text: &str) -> Result<(), SlackError> {
        let payload = json!({
            "channel": channel,
            "ts": ts,
            "text": text,
        });

        self.with_retry(|| self.post_api("chat.update", &payload))
            .await
    }

    async fn respond(&self, response_url: &str, payload: &Value) -> Result<(), SlackError> {
        self.with_retry(|| async {
            let resp = HTTP_CLIENT
                .post(response_url)
                .json(payload)
                .send()
                .await
                .map_err(|e| SlackError::HttpError(format!("response_url POST failed: {e}")))?;

            if !resp.status().is_success() {
                let status = resp.status();
                let body_text = resp
                    .text()
                    .await
                    .unwrap_or_else(|_| "<failed to read body>".to_string());
                return Err(SlackError::ApiError(format!(
                    "response_url POST failed: status={status} body={body_text}"
                )));
            }

            Ok(())
        })
        .await
    }
}
