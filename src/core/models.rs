use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::utils::filters::filter_conversation_messages;

static SLACK_TS_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+\.\d+$").expect("static regex compile"));

/// True when `ts` looks like a Slack message timestamp (`1712345678.000100`).
#[must_use]
pub fn is_valid_thread_ts(ts: &str) -> bool {
    SLACK_TS_RE.is_match(ts)
}

/// One slash-command invocation, as received. Never mutated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandInvocation {
    pub channel_id: String,
    pub user_id: String,
    pub thread_ts: Option<String>,
    pub trigger_id: String,
    pub response_url: Option<String>,
    pub command: String,
    pub text: String,
    pub received_at: DateTime<Utc>,
}

impl CommandInvocation {
    /// The thread id, only when it is well formed.
    #[must_use]
    pub fn valid_thread_ts(&self) -> Option<&str> {
        self.thread_ts.as_deref().filter(|ts| is_valid_thread_ts(ts))
    }
}

/// The message standing in for the result while the job runs.
///
/// It is the only thing tying the acknowledgment to the eventual delivery,
/// so it travels with the job, including across the relay boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlaceholderHandle {
    /// A bot message in the channel (or thread); edited in place.
    Message { channel: String, ts: String },
    /// An ephemeral notice to `user`. Slack cannot edit these, so delivery posts anew.
    Ephemeral {
        channel: String,
        user: String,
        thread_ts: Option<String>,
    },
    /// The acknowledgment message itself, replaced through `response_url`.
    ResponseUrl {
        channel: String,
        url: String,
        thread_ts: Option<String>,
    },
}

impl PlaceholderHandle {
    #[must_use]
    pub fn channel(&self) -> &str {
        match self {
            Self::Message { channel, .. }
            | Self::Ephemeral { channel, .. }
            | Self::ResponseUrl { channel, .. } => channel,
        }
    }

    /// Thread the final summary belongs in, if a well-formed one was given.
    #[must_use]
    pub fn thread_ts(&self) -> Option<&str> {
        match self {
            Self::Message { .. } => None,
            Self::Ephemeral { thread_ts, .. } | Self::ResponseUrl { thread_ts, .. } => {
                thread_ts.as_deref().filter(|ts| is_valid_thread_ts(ts))
            }
        }
    }

    /// Short identifier for logs and call accounting.
    #[must_use]
    pub fn key(&self) -> String {
        match self {
            Self::Message { channel, ts } => format!("message:{channel}:{ts}"),
            Self::Ephemeral { channel, user, .. } => format!("ephemeral:{channel}:{user}"),
            Self::ResponseUrl { channel, url, .. } => format!("response_url:{channel}:{url}"),
        }
    }
}

/// A raw message as returned by channel history or thread replies.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryMessage {
    pub ts: String,
    pub user: Option<String>,
    pub text: Option<String>,
    pub subtype: Option<String>,
}

/// Parameters of one history read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryQuery {
    pub channel: String,
    /// Unix seconds; older messages are excluded.
    pub oldest: i64,
    pub limit: u16,
    pub thread_ts: Option<String>,
}

/// The bounded, filtered slice of a conversation a job summarizes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageWindow {
    messages: Vec<HistoryMessage>,
}

impl MessageWindow {
    /// Keeps only messages without a subtype, ordered oldest first.
    #[must_use]
    pub fn from_messages(mut messages: Vec<HistoryMessage>) -> Self {
        messages = filter_conversation_messages(messages);
        messages.sort_by(|a, b| ts_key(&a.ts).total_cmp(&ts_key(&b.ts)));
        Self { messages }
    }

    #[must_use]
    pub fn messages(&self) -> &[HistoryMessage] {
        &self.messages
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// One line per message, consuming the window.
    #[must_use]
    pub fn flatten(self) -> String {
        self.messages
            .into_iter()
            .filter_map(|m| m.text)
            .filter(|t| !t.trim().is_empty())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn ts_key(ts: &str) -> f64 {
    ts.parse().unwrap_or(0.0)
}

/// Body of the relay call from the API function to the worker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobPayload {
    pub job_id: String,
    pub conversation: String,
    pub placeholder: PlaceholderHandle,
    /// Already-flattened source text; when absent the worker fetches history itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_ts: Option<String>,
}
