use std::env;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_HISTORY_WINDOW_SECS: u64 = 60 * 60 * 24;
pub const DEFAULT_HISTORY_LIMIT: u16 = 100;
pub const DEFAULT_PROVIDER_TIMEOUT_MS: u64 = 30_000;
pub const DEFAULT_SLACK_API_BASE: &str = "https://slack.com/api";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

/// How the slow half of a command is started.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchMode {
    /// Detached task in the same process. Needs a long-lived host.
    InProcess,
    /// One signed HTTP call to a separate worker endpoint.
    Relay,
}

impl FromStr for DispatchMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_process" | "in-process" | "inprocess" => Ok(Self::InProcess),
            "relay" | "background" => Ok(Self::Relay),
            other => Err(format!("unknown dispatch mode '{other}'")),
        }
    }
}

/// Which message stands in for the summary while it is being computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderMode {
    /// The slash-command acknowledgment itself, replaced via `response_url`.
    Ack,
    /// A bot message posted to the channel, updated in place.
    Message,
    /// An ephemeral notice to the invoking user.
    Ephemeral,
}

impl FromStr for PlaceholderMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ack" | "response_url" => Ok(Self::Ack),
            "message" | "channel" => Ok(Self::Message),
            "ephemeral" => Ok(Self::Ephemeral),
            other => Err(format!("unknown placeholder mode '{other}'")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub slack_signing_secret: String,
    pub slack_bot_token: String,
    pub slack_api_base: String,
    pub model_provider: String,
    pub openai_api_key: Option<String>,
    pub groq_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub groq_model: Option<String>,
    pub history_window_secs: u64,
    pub history_limit: u16,
    pub provider_timeout_ms: u64,
    pub dispatch_mode: DispatchMode,
    pub worker_url: Option<String>,
    pub placeholder_mode: PlaceholderMode,
    pub bind_addr: String,
}

impl AppConfig {
    /// Reads the process environment. Called once per invocation so key and
    /// model rotation take effect without a restart.
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Builds the configuration from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let required = |name: &str| get(name).ok_or_else(|| format!("{name}: not set"));

        let dispatch_mode = match get("DISPATCH_MODE") {
            Some(raw) => raw.parse().map_err(|e| format!("DISPATCH_MODE: {e}"))?,
            None => DispatchMode::InProcess,
        };
        let placeholder_mode = match get("PLACEHOLDER_MODE") {
            Some(raw) => raw.parse().map_err(|e| format!("PLACEHOLDER_MODE: {e}"))?,
            None => PlaceholderMode::Ack,
        };

        let worker_url = get("WORKER_URL");
        if let Some(raw) = &worker_url {
            let parsed = url::Url::parse(raw).map_err(|e| format!("WORKER_URL: {e}"))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                return Err(format!("WORKER_URL: unsupported scheme '{}'", parsed.scheme()));
            }
        }
        if dispatch_mode == DispatchMode::Relay && worker_url.is_none() {
            return Err("WORKER_URL: required when DISPATCH_MODE=relay".to_string());
        }

        Ok(Self {
            slack_signing_secret: required("SLACK_SIGNING_SECRET")?,
            slack_bot_token: required("SLACK_BOT_TOKEN")?,
            slack_api_base: get("SLACK_API_BASE")
                .unwrap_or_else(|| DEFAULT_SLACK_API_BASE.to_string()),
            model_provider: get("MODEL_PROVIDER")
                .unwrap_or_else(|| "openai".to_string())
                .to_ascii_lowercase(),
            openai_api_key: get("OPENAI_API_KEY"),
            groq_api_key: get("GROQ_API_KEY"),
            openai_model: get("OPENAI_MODEL"),
            groq_model: get("GROQ_MODEL"),
            history_window_secs: parse_or(
                get("SLACK_HISTORY_WINDOW_SEC"),
                "SLACK_HISTORY_WINDOW_SEC",
                DEFAULT_HISTORY_WINDOW_SECS,
            )?,
            history_limit: parse_or(
                get("SLACK_HISTORY_LIMIT"),
                "SLACK_HISTORY_LIMIT",
                DEFAULT_HISTORY_LIMIT,
            )?,
            provider_timeout_ms: parse_or(
                get("PROVIDER_TIMEOUT_MS"),
                "PROVIDER_TIMEOUT_MS",
                DEFAULT_PROVIDER_TIMEOUT_MS,
            )?,
            dispatch_mode,
            worker_url,
            placeholder_mode,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        })
    }

    /// Rejects in-process dispatch for hosts that freeze once the response is sent.
    ///
    /// # Errors
    ///
    /// When `dispatch_mode` is not `Relay`.
    pub fn require_relay(self) -> Result<Self, String> {
        match self.dispatch_mode {
            DispatchMode::Relay => Ok(self),
            DispatchMode::InProcess => Err(
                "DISPATCH_MODE: in_process needs a long-lived host; set DISPATCH_MODE=relay and WORKER_URL"
                    .to_string(),
            ),
        }
    }

    #[must_use]
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Values that must never show up in a user-facing message.
    #[must_use]
    pub fn secrets(&self) -> Vec<&str> {
        let mut secrets = vec![
            self.slack_signing_secret.as_str(),
            self.slack_bot_token.as_str(),
        ];
        secrets.extend(self.openai_api_key.as_deref());
        secrets.extend(self.groq_api_key.as_deref());
        secrets
    }
}

fn parse_or<T: FromStr>(raw: Option<String>, name: &str, default: T) -> Result<T, String>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.trim().parse().map_err(|e| format!("{name}: {e}")),
        None => Ok(default),
    }
}
