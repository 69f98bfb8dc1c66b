//! Prompt construction and the provider call raced against a timer.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

use crate::ai::prompt::{build_prompt, finalize_summary};
use crate::ai::{CompletionProvider, CompletionRequest, ProviderConfig};
use crate::core::config::DEFAULT_PROVIDER_TIMEOUT_MS;
use crate::errors::JobError;

pub const SUMMARY_MAX_TOKENS: u32 = 400;
pub const SUMMARY_TEMPERATURE: f32 = 0.3;

pub struct Summarizer {
    provider: Arc<dyn CompletionProvider>,
    timeout: Duration,
}

impl Summarizer {
    #[must_use]
    pub fn new(provider: Arc<dyn CompletionProvider>, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    #[must_use]
    pub fn with_default_timeout(provider: Arc<dyn CompletionProvider>) -> Self {
        Self::new(provider, Duration::from_millis(DEFAULT_PROVIDER_TIMEOUT_MS))
    }

    /// Summarizes `text` with the backend described by `config`.
    ///
    /// The provider future is dropped when the timer wins, so a late
    /// completion can never reach the caller.
    ///
    /// # Errors
    ///
    /// `EmptyInput` for blank text, `Timeout` when the budget elapses,
    /// `Provider` for every other provider failure.
    pub async fn summarize(&self, text: &str, config: &ProviderConfig) -> Result<String, JobError> {
        if text.trim().is_empty() {
            return Err(JobError::EmptyInput);
        }

        let request = CompletionRequest {
            model: config.model.clone(),
            prompt: build_prompt(text),
            max_tokens: SUMMARY_MAX_TOKENS,
            temperature: SUMMARY_TEMPERATURE,
        };

        let started = Instant::now();
        let call = self.provider.create_completion(config, &request);
        match tokio::time::timeout(self.timeout, call).await {
            Ok(Ok(response)) => {
                info!(
                    provider = config.kind.as_str(),
                    model = %config.model,
                    elapsed_ms = started.elapsed().as_millis(),
                    "Summary generated"
                );
                Ok(finalize_summary(response.first_content()))
            }
            Ok(Err(e)) => {
                error!(provider = config.kind.as_str(), error = %e, "Provider call failed");
                Err(JobError::Provider(e.to_string()))
            }
            Err(_) => {
                let budget_ms = u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX);
                warn!(provider = config.kind.as_str(), budget_ms, "Provider call timed out");
                Err(JobError::Timeout { budget_ms })
            }
        }
    }
}
