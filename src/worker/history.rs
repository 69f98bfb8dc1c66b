//! Bounded history reads with a single retry.

use chrono::Utc;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio_retry::Retry;
use tokio_retry::strategy::FixedInterval;
use tracing::{info, warn};

use crate::core::models::{HistoryQuery, MessageWindow};
use crate::errors::JobError;
use crate::slack::ChatTransport;
use crate::utils::filters::within_window;

/// Pause before the one retry of a failed history read.
pub const FETCH_RETRY_BACKOFF: Duration = Duration::from_millis(250);

pub struct HistoryFetcher {
    transport: Arc<dyn ChatTransport>,
    backoff: Duration,
}

impl HistoryFetcher {
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>) -> Self {
        Self::with_backoff(transport, FETCH_RETRY_BACKOFF)
    }

    #[must_use]
    pub fn with_backoff(transport: Arc<dyn ChatTransport>, backoff: Duration) -> Self {
        Self { transport, backoff }
    }

    /// Reads the last `window_secs` of `conversation` (or of one thread),
    /// at most `limit` messages, with subtype noise removed.
    ///
    /// # Errors
    ///
    /// `UpstreamFetch` after two failed reads; `EmptyInput` when nothing is
    /// left to summarize.
    pub async fn fetch(
        &self,
        conversation: &str,
        window_secs: u64,
        limit: u16,
        thread_ts: Option<&str>,
    ) -> Result<MessageWindow, JobError> {
        let window = i64::try_from(window_secs).unwrap_or(i64::MAX);
        let query = HistoryQuery {
            channel: conversation.to_string(),
            oldest: Utc::now().timestamp().saturating_sub(window),
            limit,
            thread_ts: thread_ts.map(ToString::to_string),
        };

        let attempts = AtomicU32::new(0);
        let strategy = FixedInterval::new(self.backoff).take(1);
        let messages = Retry::spawn(strategy, || async {
            let attempt = attempts.fetch_add(1, Ordering::SeqCst) + 1;
            self.transport.fetch_history(&query).await.map_err(|e| {
                warn!(channel = %query.channel, attempt, error = %e, "History fetch failed");
                e
            })
        })
        .await
        .map_err(|e| JobError::UpstreamFetch(e.to_string()))?;

        let fetched = messages.len();
        let window = MessageWindow::from_messages(within_window(messages, query.oldest));
        info!(
            channel = %query.channel,
            thread = query.thread_ts.as_deref().unwrap_or("-"),
            fetched,
            kept = window.len(),
            attempts = attempts.load(Ordering::SeqCst),
            "History window ready"
        );

        if window.is_empty() {
            return Err(JobError::EmptyInput);
        }
        Ok(window)
    }
}
