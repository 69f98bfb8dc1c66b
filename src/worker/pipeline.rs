//! The slow half of a command: fetch, summarize, deliver.

use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

use super::deliver::deliver;
use super::history::{FETCH_RETRY_BACKOFF, HistoryFetcher};
use super::summarize::Summarizer;
use crate::ai::{CompletionProvider, ProviderConfig};
use crate::core::config::{
    AppConfig, DEFAULT_HISTORY_LIMIT, DEFAULT_HISTORY_WINDOW_SECS, DEFAULT_PROVIDER_TIMEOUT_MS,
};
use crate::core::models::JobPayload;
use crate::errors::{JobError, SummaryResult};
use crate::slack::ChatTransport;

/// Per-invocation knobs, resolved from configuration before the job starts.
#[derive(Debug, Clone)]
pub struct ContinuationSettings {
    pub window_secs: u64,
    pub limit: u16,
    pub provider_timeout: Duration,
    pub fetch_backoff: Duration,
    /// Resolution failures surface as `provider_error` once there is text to summarize.
    pub provider: Result<ProviderConfig, JobError>,
    pub secrets: Vec<String>,
}

impl ContinuationSettings {
    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            window_secs: config.history_window_secs,
            limit: config.history_limit,
            provider_timeout: config.provider_timeout(),
            fetch_backoff: FETCH_RETRY_BACKOFF,
            provider: ProviderConfig::resolve(config),
            secrets: config.secrets().into_iter().map(ToString::to_string).collect(),
        }
    }

    #[must_use]
    pub fn with_provider(provider: ProviderConfig) -> Self {
        Self {
            window_secs: DEFAULT_HISTORY_WINDOW_SECS,
            limit: DEFAULT_HISTORY_LIMIT,
            provider_timeout: Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS),
            fetch_backoff: FETCH_RETRY_BACKOFF,
            secrets: vec![provider.api_key.clone()],
            provider: Ok(provider),
        }
    }
}

pub struct Continuation {
    transport: Arc<dyn ChatTransport>,
    fetcher: HistoryFetcher,
    summarizer: Summarizer,
    settings: ContinuationSettings,
}

impl Continuation {
    #[must_use]
    pub fn new(
        transport: Arc<dyn ChatTransport>,
        provider: Arc<dyn CompletionProvider>,
        settings: ContinuationSettings,
    ) -> Self {
        Self {
            fetcher: HistoryFetcher::with_backoff(Arc::clone(&transport), settings.fetch_backoff),
            summarizer: Summarizer::new(provider, settings.provider_timeout),
            transport,
            settings,
        }
    }

    #[must_use]
    pub fn secrets(&self) -> Vec<&str> {
        self.settings.secrets.iter().map(String::as_str).collect()
    }

    /// Runs the job to completion and delivers its outcome exactly once.
    ///
    /// Never fails: every error becomes a placeholder update, and a failed
    /// update is only logged since nobody is left to observe it.
    pub async fn run(&self, job: JobPayload) -> SummaryResult {
        info!(job_id = %job.job_id, channel = %job.conversation, "Continuation started");

        let result = self.produce(&job).await;

        if let Err(e) = deliver(
            self.transport.as_ref(),
            &job.placeholder,
            &result,
            &self.secrets(),
        )
        .await
        {
            error!(
                job_id = %job.job_id,
                placeholder = %job.placeholder.key(),
                error = %e,
                "Failed to deliver result"
            );
        }

        match &result {
            Ok(_) => info!(job_id = %job.job_id, "Continuation finished"),
            Err(e) => info!(job_id = %job.job_id, outcome = e.code(), "Continuation finished without summary"),
        }
        result
    }

    async fn produce(&self, job: &JobPayload) -> SummaryResult {
        let text = match &job.text {
            Some(text) => text.clone(),
            None => self
                .fetcher
                .fetch(
                    &job.conversation,
                    self.settings.window_secs,
                    self.settings.limit,
                    job.thread_ts.as_deref(),
                )
                .await?
                .flatten(),
        };

        if text.trim().is_empty() {
            return Err(JobError::EmptyInput);
        }

        let provider = self.settings.provider.as_ref().map_err(Clone::clone)?;
        self.summarizer.summarize(&text, provider).await
    }
}
