//! API handler - thin router shared by the Lambda and server entrypoints.
//!
//! This module handles:
//! - Health checks on the command route
//! - Request validation (signature, body)
//! - Slash commands (delegated to `JobRelay`)
//! - Relayed jobs (delegated to the worker handler)

use lambda_runtime::{Error, LambdaEvent};
use serde_json::Value;
use tracing::{error, info};

use super::helpers;
use super::parsing::IncomingRequest;
use super::signature::{SLACK_SIGNATURE_HEADER, SLACK_TIMESTAMP_HEADER, verify_signature};
use crate::bot::RecapBot;
use crate::core::config::AppConfig;
use crate::errors::JobError;
use crate::slack::command_parser::parse_command;
use crate::worker;

pub const COMMAND_PATH: &str = "/api/slack/event";
pub const WORKER_PATH: &str = "/api/summarize/background";

pub use self::function_handler as handler;

/// Lambda handler for the API entrypoint.
///
/// # Errors
///
/// Returns an error only when configuration is missing or not relayed;
/// request problems are answered with an error status instead.
#[tracing::instrument(level = "info", skip(event))]
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    // Lambda freezes after responding, so a detached task here would never finish.
    let config = AppConfig::from_env()
        .and_then(AppConfig::require_relay)
        .map_err(|e| {
            error!("Config error: {}", e);
            Error::from(e)
        })?;
    let bot = RecapBot::new(&config).map_err(|e| {
        error!("Failed to initialize bot: {}", e);
        Error::from(e.to_string())
    })?;

    let request = match IncomingRequest::from_lambda_payload(&event.payload) {
        Ok(request) => request,
        Err(e) => {
            error!("Unreadable request: {}", e);
            return Ok(helpers::err_response(400, &e.to_string()));
        }
    };

    // Direct invocations carry no path; treat them as slash commands.
    let request = if request.path.is_empty() {
        IncomingRequest {
            path: COMMAND_PATH.to_string(),
            ..request
        }
    } else {
        request
    };

    Ok(route(&config, &bot, &request).await)
}

/// Routes a request to the command, worker, health or fallback handler.
pub async fn route(config: &AppConfig, bot: &RecapBot, request: &IncomingRequest) -> Value {
    info!(method = %request.method, path = %request.path, "Request received");

    if request.path.ends_with(WORKER_PATH) {
        return worker::handler::handle_job_request(config, bot, request).await;
    }

    if request.path.ends_with(COMMAND_PATH) {
        return match request.method.as_str() {
            "GET" => helpers::health(),
            "POST" => handle_command(config, bot, request).await,
            _ => helpers::method_not_allowed(),
        };
    }

    helpers::not_found(&request.path)
}

/// Verifies, parses and acknowledges one slash command.
pub async fn handle_command(config: &AppConfig, bot: &RecapBot, request: &IncomingRequest) -> Value {
    if let Err(response) = verify_slack_request(request, config) {
        return response;
    }

    let invocation = match parse_command(&request.body) {
        Ok(invocation) => invocation,
        Err(e) => {
            let failure = JobError::AckFailed(e.to_string());
            error!(code = failure.code(), "Failed to parse slash command: {}", e);
            return helpers::err_response(400, &format!("Parse Error: {e}"));
        }
    };

    let relay = match bot.relay(config) {
        Ok(relay) => relay,
        Err(e) => {
            error!(code = e.code(), "Relay unavailable: {}", e);
            return helpers::ok_ephemeral(&crate::worker::deliver::render_result(
                &Err(e),
                &config.secrets(),
            ));
        }
    };

    relay.handle(&invocation).await.to_response()
}

fn verify_slack_request(request: &IncomingRequest, config: &AppConfig) -> Result<(), Value> {
    let Some(sig) = request.header(SLACK_SIGNATURE_HEADER) else {
        error!("Missing X-Slack-Signature header");
        return Err(helpers::err_response(401, "Missing X-Slack-Signature header"));
    };

    let Some(timestamp) = request.header(SLACK_TIMESTAMP_HEADER) else {
        error!("Missing X-Slack-Request-Timestamp header");
        return Err(helpers::err_response(
            401,
            "Missing X-Slack-Request-Timestamp header",
        ));
    };

    if !verify_signature(&request.body, timestamp, sig, &config.slack_signing_secret) {
        error!("Slack signature verification failed");
        return Err(helpers::err_response(401, "Invalid Slack signature"));
    }

    Ok(())
}
