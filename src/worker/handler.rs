use lambda_runtime::{Error, LambdaEvent};
use serde_json::{Value, json};
use tracing::{error, info};

use crate::api::helpers;
use crate::api::parsing::IncomingRequest;
use crate::api::signature::{RELAY_SIGNATURE_HEADER, RELAY_TIMESTAMP_HEADER, verify_signature};
use crate::bot::RecapBot;
use crate::core::config::AppConfig;
use crate::core::models::JobPayload;

/// Lambda handler for the Worker entrypoint. Every request it receives is a relayed job.
pub async fn function_handler(event: LambdaEvent<Value>) -> Result<Value, Error> {
    let config = AppConfig::from_env().map_err(|e| {
        error!("Config error: {}", e);
        Error::from(e)
    })?;
    let bot = RecapBot::new(&config)
        .map_err(|e| Error::from(format!("Failed to initialize bot: {e}")))?;

    let request = match IncomingRequest::from_lambda_payload(&event.payload) {
        Ok(request) => request,
        Err(e) => {
            error!("Unreadable job request: {}", e);
            return Ok(helpers::err_response(400, &e.to_string()));
        }
    };

    Ok(handle_job_request(&config, &bot, &request).await)
}

pub use self::function_handler as handler;

/// Verifies and runs one relayed job, answering once its result is delivered.
///
/// The relay stops waiting long before this returns; the status only matters
/// when the worker rejects the job outright.
pub async fn handle_job_request(
    config: &AppConfig,
    bot: &RecapBot,
    request: &IncomingRequest,
) -> Value {
    if !request.is_post() {
        return helpers::method_not_allowed();
    }

    let (Some(signature), Some(timestamp)) = (
        request.header(RELAY_SIGNATURE_HEADER),
        request.header(RELAY_TIMESTAMP_HEADER),
    ) else {
        error!("Job request is missing relay signature headers");
        return helpers::err_response(401, "Missing relay signature");
    };
    if !verify_signature(&request.body, timestamp, signature, &config.slack_signing_secret) {
        return helpers::err_response(401, "Invalid relay signature");
    }

    let job: JobPayload = match serde_json::from_str(&request.body) {
        Ok(job) => job,
        Err(e) => {
            error!("Failed to parse job payload: {}", e);
            return helpers::err_response(400, &format!("Invalid job payload: {e}"));
        }
    };

    info!(job_id = %job.job_id, placeholder = %job.placeholder.key(), "Job accepted");
    let job_id = job.job_id.clone();
    let outcome = match bot.continuation(config).run(job).await {
        Ok(_) => "summary",
        Err(e) => e.code(),
    };

    helpers::json_response(
        202,
        &json!({ "ok": true, "job_id": job_id, "outcome": outcome }),
    )
}
