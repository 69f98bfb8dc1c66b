//! slack-recap - a Slack slash command that summarizes recent channel or thread history.
//!
//! A slash command must be acknowledged within three seconds, while fetching
//! history and asking a model for a summary routinely takes longer. The crate
//! splits the work in two:
//! 1. The API entrypoint verifies the command, binds a placeholder message and
//!    dispatches a job, then acknowledges.
//! 2. The job (a detached task, or a relayed call to the worker entrypoint)
//!    fetches history, summarizes it and replaces the placeholder exactly once.
//!
//! # Architecture
//!
//! The system uses:
//! - AWS Lambda (`recap-api`, `recap-worker`) or a long-lived axum host (`recap-server`)
//! - slack-morphism and the Slack Web API for history and message updates
//! - An OpenAI-compatible chat-completions endpoint (OpenAI or Groq)
//! - Tokio for async runtime
//!
//! # Example
//!
//! ```no_run
//! use slack_recap::RecapBot;
//! use slack_recap::core::config::AppConfig;
//! use slack_recap::core::models::{JobPayload, PlaceholderHandle};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     slack_recap::setup_logging();
//!
//!     let config = AppConfig::from_env()?;
//!     let bot = RecapBot::new(&config)?;
//!
//!     // Summarize the last day of a channel into an existing bot message
//!     let result = bot
//!         .continuation(&config)
//!         .run(JobPayload {
//!             job_id: "demo".into(),
//!             conversation: "C12345678".into(),
//!             placeholder: PlaceholderHandle::Message {
//!                 channel: "C12345678".into(),
//!                 ts: "1700000000.000100".into(),
//!             },
//!             text: None,
//!             thread_ts: None,
//!         })
//!         .await;
//!
//!     match result {
//!         Ok(summary) => println!("Summary: {summary}"),
//!         Err(e) => println!("No summary: {}", e.code()),
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod ai;
pub mod api;
pub mod bot;
pub mod core;
pub mod errors;
#[cfg(feature = "server")]
pub mod server;
pub mod slack;
pub mod utils;
pub mod worker;

pub use bot::RecapBot;
pub use errors::{JobError, SlackError, SummaryResult};

/// Configure structured logging with JSON format.
///
/// JSON lines suit `CloudWatch` Logs as well as a container log collector.
/// The level comes from `RUST_LOG` and defaults to `info`. Safe to call more
/// than once; later calls are no-ops.
///
/// # Example
///
/// ```
/// slack_recap::setup_logging();
/// ```
pub fn setup_logging() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::prelude::*;

    let default_level = if cfg!(feature = "debug-logs") {
        "debug"
    } else {
        "info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let fmt_layer = tracing_subscriber::fmt::layer().json().with_target(true);

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}
