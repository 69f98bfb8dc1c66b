//! Acknowledge fast, work later.
//!
//! `JobRelay::handle` turns a slash command into an acknowledgment that fits
//! inside Slack's three-second window, a placeholder the result will later
//! replace, and a dispatched continuation. Whatever happens after the
//! acknowledgment is reported through that placeholder.

use serde_json::Value;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::dispatch::JobDispatcher;
use super::helpers::{ok_empty, ok_ephemeral};
use crate::core::config::PlaceholderMode;
use crate::core::models::{CommandInvocation, JobPayload, PlaceholderHandle};
use crate::errors::SummaryResult;
use crate::slack::ChatTransport;
use crate::worker::deliver::{PLACEHOLDER_TEXT, deliver, render_result};

/// Slack drops slash commands not acknowledged within this window.
pub const ACK_DEADLINE: Duration = Duration::from_millis(3_000);
/// Headroom left for serializing and sending the acknowledgment itself.
pub const ACK_SAFETY_MARGIN: Duration = Duration::from_millis(500);
/// Floor for reporting a dispatch failure, taken out of the safety margin if need be.
const MIN_FAILURE_REPORT_TIME: Duration = Duration::from_millis(250);

/// What the command handler answers Slack with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AckResult {
    pub job_id: String,
    pub placeholder: PlaceholderHandle,
    /// Ephemeral text carried by the acknowledgment. `None` when the
    /// placeholder was posted as its own message and the ack stays empty.
    pub text: Option<String>,
    pub dispatched: bool,
}

impl AckResult {
    /// Lambda-proxy response for the slash-command request.
    #[must_use]
    pub fn to_response(&self) -> Value {
        match &self.text {
            Some(text) => ok_ephemeral(text),
            None => ok_empty(),
        }
    }
}

pub struct JobRelay {
    transport: Arc<dyn ChatTransport>,
    dispatcher: Arc<dyn JobDispatcher>,
    placeholder_mode: PlaceholderMode,
    budget: Duration,
    secrets: Vec<String>,
}

impl JobRelay {
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        dispatcher: Arc<dyn JobDispatcher>,
        placeholder_mode: PlaceholderMode,
    ) -> Self {
        Self {
            transport,
            dispatcher,
            placeholder_mode,
            budget: ACK_DEADLINE.saturating_sub(ACK_SAFETY_MARGIN),
            secrets: Vec::new(),
        }
    }

    /// Overrides the time allowed for placeholder + dispatch.
    #[must_use]
    pub fn with_budget(mut self, budget: Duration) -> Self {
        self.budget = budget;
        self
    }

    /// Values scrubbed from diagnostics shown to users.
    #[must_use]
    pub fn with_secrets(mut self, secrets: Vec<String>) -> Self {
        self.secrets = secrets;
        self
    }

    /// Acknowledges `invocation`, binds a placeholder and dispatches the job.
    ///
    /// Returns before the acknowledgment deadline. On dispatch failure the
    /// error has already been delivered through the placeholder (or is carried
    /// by the acknowledgment when the placeholder is the acknowledgment).
    pub async fn handle(&self, invocation: &CommandInvocation) -> AckResult {
        let started = Instant::now();
        let job_id = Uuid::new_v4().to_string();
        info!(
            job_id = %job_id,
            channel = %invocation.channel_id,
            user = %invocation.user_id,
            command = %invocation.command,
            dispatcher = self.dispatcher.name(),
            "Slash command received"
        );

        let (placeholder, posted) = self.obtain_placeholder(invocation, started).await;

        let job = JobPayload {
            job_id: job_id.clone(),
            conversation: invocation.channel_id.clone(),
            placeholder: placeholder.clone(),
            text: None,
            thread_ts: invocation.valid_thread_ts().map(ToString::to_string),
        };

        // Not raced: a relay send the worker already accepted cannot be taken back.
        let remaining = self.budget.saturating_sub(started.elapsed());
        let dispatched = self.dispatcher.dispatch(job, remaining).await;

        let mut text = (!posted).then(|| PLACEHOLDER_TEXT.to_string());
        let dispatched = match dispatched {
            Ok(()) => true,
            Err(e) => {
                error!(job_id = %job_id, error = %e, "Dispatch failed");
                let failure: SummaryResult = Err(e);
                if posted {
                    self.report_failure(&job_id, &placeholder, &failure, started).await;
                } else {
                    // The acknowledgment is the placeholder: it carries the failure itself.
                    text = Some(render_result(&failure, &self.secret_refs()));
                }
                false
            }
        };

        info!(
            job_id = %job_id,
            placeholder = %placeholder.key(),
            dispatched,
            elapsed_ms = started.elapsed().as_millis(),
            "Slash command acknowledged"
        );
        AckResult {
            job_id,
            placeholder,
            text,
            dispatched,
        }
    }

    fn secret_refs(&self) -> Vec<&str> {
        self.secrets.iter().map(String::as_str).collect()
    }

    /// Returns the handle and whether a separate placeholder message was posted.
    async fn obtain_placeholder(
        &self,
        invocation: &CommandInvocation,
        started: Instant,
    ) -> (PlaceholderHandle, bool) {
        let channel = invocation.channel_id.clone();
        let thread_ts = invocation.valid_thread_ts().map(ToString::to_string);
        let remaining = self.budget.saturating_sub(started.elapsed());

        let posted = match self.placeholder_mode {
            PlaceholderMode::Ack => None,
            PlaceholderMode::Message => {
                let post = self
                    .transport
                    .post_placeholder(&channel, thread_ts.as_deref(), PLACEHOLDER_TEXT);
                match tokio::time::timeout(remaining, post).await {
                    Ok(Ok(ts)) => Some(PlaceholderHandle::Message {
                        channel: channel.clone(),
                        ts,
                    }),
                    Ok(Err(e)) => {
                        warn!(channel = %channel, error = %e, "Placeholder post failed");
                        None
                    }
                    Err(_) => {
                        warn!(channel = %channel, "Placeholder post timed out");
                        None
                    }
                }
            }
            PlaceholderMode::Ephemeral => {
                let post = self.transport.post_ephemeral(
                    &channel,
                    &invocation.user_id,
                    thread_ts.as_deref(),
                    PLACEHOLDER_TEXT,
                );
                match tokio::time::timeout(remaining, post).await {
                    Ok(Ok(())) => Some(PlaceholderHandle::Ephemeral {
                        channel: channel.clone(),
                        user: invocation.user_id.clone(),
                        thread_ts: thread_ts.clone(),
                    }),
                    Ok(Err(e)) => {
                        warn!(channel = %channel, error = %e, "Ephemeral placeholder failed");
                        None
                    }
                    Err(_) => {
                        warn!(channel = %channel, "Ephemeral placeholder timed out");
                        None
                    }
                }
            }
        };

        if let Some(handle) = posted {
            return (handle, true);
        }

        let handle = match &invocation.response_url {
            Some(url) => PlaceholderHandle::ResponseUrl {
                channel,
                url: url.clone(),
                thread_ts,
            },
            None => PlaceholderHandle::Ephemeral {
                channel,
                user: invocation.user_id.clone(),
                thread_ts,
            },
        };
        (handle, false)
    }

    async fn report_failure(
        &self,
        job_id: &str,
        placeholder: &PlaceholderHandle,
        failure: &SummaryResult,
        started: Instant,
    ) {
        let remaining = self
            .budget
            .saturating_sub(started.elapsed())
            .max(MIN_FAILURE_REPORT_TIME);
        let secrets = self.secret_refs();
        let delivery = deliver(self.transport.as_ref(), placeholder, failure, &secrets);
        match tokio::time::timeout(remaining, delivery).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                error!(job_id = %job_id, error = %e, "Failed to report dispatch failure");
            }
            Err(_) => {
                error!(job_id = %job_id, "Timed out reporting dispatch failure");
            }
        }
    }
}
