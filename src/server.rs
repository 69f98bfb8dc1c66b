//! Long-lived HTTP host for the same routes the Lambda entrypoints serve.
//!
//! In-process dispatch needs a process that outlives the acknowledgment;
//! this is that process. Configuration is still read per request, so key and
//! model rotation apply without a restart.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::{HeaderMap, Method, StatusCode, Uri, header},
    response::{IntoResponse, Response},
    routing::any,
};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::api::handler::{COMMAND_PATH, WORKER_PATH, route};
use crate::api::helpers::status_of;
use crate::api::parsing::IncomingRequest;
use crate::bot::RecapBot;
use crate::core::config::AppConfig;

/// Startup configuration and bot, used when a fresh read fails.
#[derive(Clone)]
pub struct ServerState {
    pub config: Arc<AppConfig>,
    pub bot: RecapBot,
}

/// Routes served by the long-lived host.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route(COMMAND_PATH, any(proxy))
        .route(WORKER_PATH, any(proxy))
        .fallback(proxy)
        .with_state(state)
}

/// Binds `config.bind_addr` and serves until the process exits.
///
/// # Errors
///
/// Fails when the address cannot be bound or the server stops with an error.
pub async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let bot = RecapBot::new(&config)?;
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(
        addr = %config.bind_addr,
        dispatch = ?config.dispatch_mode,
        placeholder = ?config.placeholder_mode,
        "Server listening"
    );

    let state = ServerState {
        config: Arc::new(config),
        bot,
    };
    axum::serve(listener, router(state)).await?;
    Ok(())
}

async fn proxy(
    State(state): State<ServerState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: String,
) -> Response {
    let mut request = IncomingRequest::new(method.as_str(), uri.path(), &body);
    for (name, value) in &headers {
        if let Ok(value) = value.to_str() {
            request = request.with_header(name.as_str(), value);
        }
    }

    let config = request_config(&state.config, AppConfig::from_env());
    let bot = request_bot(&state, &config);

    // Spawned so a caller that stops waiting (the relay does) cannot cancel the job.
    let task = tokio::spawn(async move { route(&config, &bot, &request).await });
    match task.await {
        Ok(value) => to_response(&value),
        Err(e) => {
            error!("Request task failed: {}", e);
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        }
    }
}

/// The environment as it reads now, or the startup snapshot if it no longer loads.
fn request_config(startup: &Arc<AppConfig>, loaded: Result<AppConfig, String>) -> Arc<AppConfig> {
    match loaded {
        Ok(config) => Arc::new(config),
        Err(e) => {
            warn!(error = %e, "Config reload failed; using startup config");
            Arc::clone(startup)
        }
    }
}

/// Reuses the startup bot unless the Slack credentials it was built with changed.
fn request_bot(state: &ServerState, config: &AppConfig) -> RecapBot {
    if config.slack_bot_token == state.config.slack_bot_token
        && config.slack_api_base == state.config.slack_api_base
    {
        return state.bot.clone();
    }
    match RecapBot::new(config) {
        Ok(bot) => bot,
        Err(e) => {
            warn!(error = %e, "Bot rebuild failed; using startup bot");
            state.bot.clone()
        }
    }
}

/// Converts a proxy-shaped `{statusCode, headers, body}` value into an HTTP response.
fn to_response(value: &Value) -> Response {
    let status = StatusCode::from_u16(status_of(value)).unwrap_or(StatusCode::OK);
    let body = value
        .get("body")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();
    let content_type = value
        .get("headers")
        .and_then(|h| h.get("Content-Type"))
        .and_then(Value::as_str)
        .unwrap_or("text/plain; charset=utf-8")
        .to_string();

    (status, [(header::CONTENT_TYPE, content_type)], body).into_response()
}
