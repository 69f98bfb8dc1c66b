//! Provider selection and the call shape shared by both backends.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::config::AppConfig;
use crate::errors::{JobError, SlackError};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";
pub const OPENAI_DEFAULT_MODEL: &str = "gpt-4o-mini";
pub const GROQ_DEFAULT_MODEL: &str = "llama3-8b-8192";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    OpenAi,
    Groq,
}

impl ProviderKind {
    /// Anything other than `groq` falls back to the default provider.
    #[must_use]
    pub fn from_selector(selector: &str) -> Self {
        if selector.trim().eq_ignore_ascii_case("groq") {
            Self::Groq
        } else {
            Self::OpenAi
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Groq => "groq",
        }
    }

    #[must_use]
    pub fn base_url(self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_BASE_URL,
            Self::Groq => GROQ_BASE_URL,
        }
    }

    #[must_use]
    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => OPENAI_DEFAULT_MODEL,
            Self::Groq => GROQ_DEFAULT_MODEL,
        }
    }
}

/// Backend, credentials and model for one invocation.
#[derive(Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    pub kind: ProviderKind,
    pub api_key: String,
    pub base_url: String,
    pub model: String,
}

impl std::fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("kind", &self.kind)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("model", &self.model)
            .finish()
    }
}

impl ProviderConfig {
    /// Pure function of configuration. Not cached: call it per invocation.
    ///
    /// # Errors
    ///
    /// Returns `JobError::Provider` when the selected backend has no API key.
    pub fn resolve(config: &AppConfig) -> Result<Self, JobError> {
        let kind = ProviderKind::from_selector(&config.model_provider);
        let (key, model, key_name) = match kind {
            ProviderKind::OpenAi => (&config.openai_api_key, &config.openai_model, "OPENAI_API_KEY"),
            ProviderKind::Groq => (&config.groq_api_key, &config.groq_model, "GROQ_API_KEY"),
        };
        let api_key = key
            .clone()
            .ok_or_else(|| JobError::Provider(format!("{key_name} is not configured")))?;

        Ok(Self {
            kind,
            api_key,
            base_url: kind.base_url().to_string(),
            model: model
                .clone()
                .unwrap_or_else(|| kind.default_model().to_string()),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompletionChoice {
    pub content: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct CompletionResponse {
    pub choices: Vec<CompletionChoice>,
}

impl CompletionResponse {
    #[must_use]
    pub fn first_content(&self) -> Option<&str> {
        self.choices.first().and_then(|c| c.content.as_deref())
    }
}

/// A generative-text backend.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// # Errors
    ///
    /// Returns an error when the request cannot be sent or the provider rejects it.
    async fn create_completion(
        &self,
        config: &ProviderConfig,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, SlackError>;
}
