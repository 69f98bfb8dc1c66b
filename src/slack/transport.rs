//! The chat-platform calls the relay and the worker depend on.

use async_trait::async_trait;
use serde_json::Value;

use crate::core::models::{HistoryMessage, HistoryQuery};
use crate::errors::SlackError;

/// Outbound chat-platform operations.
///
/// `SlackClient` is the production implementation; tests substitute
/// recording doubles.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Posts a visible placeholder and returns its message timestamp.
    async fn post_placeholder(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<String, SlackError>;

    /// Posts an ephemeral message only `user` can see.
    async fn post_ephemeral(
        &self,
        channel: &str,
        user: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), SlackError>;

    /// One history read. An `ok:false` answer is an error, same as a transport failure.
    async fn fetch_history(&self, query: &HistoryQuery) -> Result<Vec<HistoryMessage>, SlackError>;

    async fn post_message(
        &self,
        channel: &str,
        thread_ts: Option<&str>,
        text: &str,
    ) -> Result<(), SlackError>;

    async fn update_message(&self, channel: &str, ts: &str, text: &str) -> Result<(), SlackError>;

    /// POSTs a payload to a slash-command `response_url`.
    async fn respond(&self, response_url: &str, payload: &Value) -> Result<(), SlackError>;
}
