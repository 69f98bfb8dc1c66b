//! Pushes a finished job's outcome into the placeholder.

use tracing::info;

use crate::core::models::PlaceholderHandle;
use crate::errors::{JobError, SlackError, SummaryResult};
use crate::slack::ChatTransport;
use crate::slack::response_builder::create_replace_original_payload;
use crate::utils::redact::redact_diagnostic;

/// Text shown while the summary is being computed.
pub const PLACEHOLDER_TEXT: &str = "📝 Summarizing…";

/// Fixed notice for a conversation with nothing to summarize.
pub const NOTHING_TO_SUMMARIZE: &str = "Nothing to summarize 👌";

/// User-facing text for an outcome. Diagnostics are scrubbed of `secrets`.
#[must_use]
pub fn render_result(result: &SummaryResult, secrets: &[&str]) -> String {
    match result {
        Ok(summary) => summary.clone(),
        Err(JobError::EmptyInput) => NOTHING_TO_SUMMARIZE.to_string(),
        Err(JobError::Timeout { budget_ms }) => format!(
            "⚠️ The model took longer than {} s. Please try again later.",
            budget_ms.div_ceil(1_000)
        ),
        Err(JobError::Provider(reason)) => format!(
            "⚠️ Couldn't summarize: model error ({}).",
            redact_diagnostic(reason, secrets)
        ),
        Err(JobError::UpstreamFetch(reason)) => format!(
            "⚠️ Couldn't read the conversation history ({}). Please try again.",
            redact_diagnostic(reason, secrets)
        ),
        Err(JobError::DispatchFailed(reason)) => format!(
            "⚠️ Couldn't start the summary ({}). Please try again.",
            redact_diagnostic(reason, secrets)
        ),
        Err(JobError::AckFailed(reason)) => format!(
            "⚠️ Couldn't handle the command ({}).",
            redact_diagnostic(reason, secrets)
        ),
    }
}

/// Replaces the placeholder behind `handle` with the rendered `result`.
///
/// Each call overwrites what the user sees; callers make exactly one call per handle.
///
/// # Errors
///
/// Returns the transport error when Slack rejects the update.
pub async fn deliver(
    transport: &dyn ChatTransport,
    handle: &PlaceholderHandle,
    result: &SummaryResult,
    secrets: &[&str],
) -> Result<(), SlackError> {
    let text = render_result(result, secrets);
    let outcome = match result {
        Ok(_) => "summary",
        Err(e) => e.code(),
    };
    info!(placeholder = %handle.key(), outcome, "Delivering result");

    match handle {
        PlaceholderHandle::Message { channel, ts } => {
            transport.update_message(channel, ts, &text).await
        }
        PlaceholderHandle::Ephemeral { channel, user, .. } => {
            if result.is_ok() {
                transport
                    .post_message(channel, handle.thread_ts(), &text)
                    .await
            } else {
                transport
                    .post_ephemeral(channel, user, handle.thread_ts(), &text)
                    .await
            }
        }
        PlaceholderHandle::ResponseUrl { url, .. } => {
            let payload = if result.is_ok() {
                create_replace_original_payload(&text, true, handle.thread_ts())
            } else {
                create_replace_original_payload(&text, false, None)
            };
            transport.respond(url, &payload).await
        }
    }
}
