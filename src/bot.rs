use std::sync::Arc;

use crate::ai::{CompletionProvider, LlmClient};
use crate::api::dispatch::{DetachedTask, HttpRelay, JobDispatcher};
use crate::api::relay::JobRelay;
use crate::core::config::{AppConfig, DispatchMode};
use crate::errors::{JobError, SlackError};
use crate::slack::{ChatTransport, SlackClient};
use crate::worker::pipeline::{Continuation, ContinuationSettings};

/// The Slack transport and model provider every handler works with.
#[derive(Clone)]
pub struct RecapBot {
    transport: Arc<dyn ChatTransport>,
    provider: Arc<dyn CompletionProvider>,
}

impl RecapBot {
    /// Construct a `RecapBot` composed of a `SlackClient` and an `LlmClient`.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client cannot be built.
    pub fn new(config: &AppConfig) -> Result<Self, SlackError> {
        let slack_client = SlackClient::with_api_base(
            config.slack_bot_token.clone(),
            config.slack_api_base.clone(),
        );
        let llm_client = LlmClient::new()?;

        Ok(Self::from_parts(Arc::new(slack_client), Arc::new(llm_client)))
    }

    #[must_use]
    pub fn from_parts(
        transport: Arc<dyn ChatTransport>,
        provider: Arc<dyn CompletionProvider>,
    ) -> Self {
        Self {
            transport,
            provider,
        }
    }

    #[must_use]
    pub fn transport(&self) -> Arc<dyn ChatTransport> {
        Arc::clone(&self.transport)
    }

    #[must_use]
    pub fn provider(&self) -> Arc<dyn CompletionProvider> {
        Arc::clone(&self.provider)
    }

    /// The continuation for one invocation, with settings read from `config`.
    #[must_use]
    pub fn continuation(&self, config: &AppConfig) -> Continuation {
        Continuation::new(
            self.transport(),
            self.provider(),
            ContinuationSettings::from_config(config),
        )
    }

    /// The dispatch strategy `config` selects.
    ///
    /// # Errors
    ///
    /// `DispatchFailed` when relay mode has no usable worker URL.
    pub fn dispatcher(&self, config: &AppConfig) -> Result<Arc<dyn JobDispatcher>, JobError> {
        match config.dispatch_mode {
            DispatchMode::InProcess => {
                Ok(Arc::new(DetachedTask::new(Arc::new(self.continuation(config)))))
            }
            DispatchMode::Relay => {
                let worker_url = config.worker_url.clone().ok_or_else(|| {
                    JobError::DispatchFailed("WORKER_URL is not configured".to_string())
                })?;
                Ok(Arc::new(HttpRelay::new(
                    worker_url,
                    config.slack_signing_secret.clone(),
                )?))
            }
        }
    }

    /// A relay wired for one invocation.
    ///
    /// # Errors
    ///
    /// Propagates dispatcher construction failures.
    pub fn relay(&self, config: &AppConfig) -> Result<JobRelay, JobError> {
        Ok(
            JobRelay::new(self.transport(), self.dispatcher(config)?, config.placeholder_mode)
                .with_secrets(config.secrets().into_iter().map(ToString::to_string).collect()),
        )
    }
}
