use slack_morphism::errors::SlackClientError;
use thiserror::Error;

/// Failures at the I/O edges: Slack Web API, the model provider, the relay call.
#[derive(Debug, Error)]
pub enum SlackError {
    #[error("Failed to parse Slack event: {0}")]
    ParseError(String),

    #[error("Failed to access Slack API: {0}")]
    ApiError(String),

    #[error("Failed to access model provider: {0}")]
    ProviderError(String),

    #[error("Failed to send HTTP request: {0}")]
    HttpError(String),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),
}

impl From<SlackClientError> for SlackError {
    fn from(error: SlackClientError) -> Self {
        SlackError::ApiError(error.to_string())
    }
}

impl From<reqwest::Error> for SlackError {
    fn from(error: reqwest::Error) -> Self {
        SlackError::HttpError(error.to_string())
    }
}

impl From<serde_json::Error> for SlackError {
    fn from(error: serde_json::Error) -> Self {
        SlackError::ParseError(error.to_string())
    }
}

impl From<anyhow::Error> for SlackError {
    fn from(error: anyhow::Error) -> Self {
        SlackError::ApiError(error.to_string())
    }
}

/// Terminal outcome of a summarize job other than a summary.
///
/// Every variant except `AckFailed` is recoverable: it is rendered into the
/// placeholder message instead of being propagated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JobError {
    #[error("acknowledgment failed: {0}")]
    AckFailed(String),

    #[error("history fetch failed: {0}")]
    UpstreamFetch(String),

    #[error("nothing to summarize")]
    EmptyInput,

    #[error("provider call exceeded {budget_ms} ms")]
    Timeout { budget_ms: u64 },

    #[error("provider error: {0}")]
    Provider(String),

    #[error("dispatch failed: {0}")]
    DispatchFailed(String),
}

impl JobError {
    /// Stable snake_case code, used in logs and relay responses.
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            JobError::AckFailed(_) => "ack_failed",
            JobError::UpstreamFetch(_) => "upstream_fetch_error",
            JobError::EmptyInput => "empty_input",
            JobError::Timeout { .. } => "timeout",
            JobError::Provider(_) => "provider_error",
            JobError::DispatchFailed(_) => "dispatch_failed",
        }
    }
}

/// What a finished job hands to delivery: the summary or the reason there is none.
pub type SummaryResult = Result<String, JobError>;
