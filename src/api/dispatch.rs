//! Strategies for starting the slow half of a command without blocking the ack.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::signature::{RELAY_SIGNATURE_HEADER, RELAY_TIMESTAMP_HEADER, compute_signature};
use crate::core::models::JobPayload;
use crate::errors::JobError;
use crate::worker::pipeline::Continuation;

/// How long the relay waits to connect to the worker.
pub const RELAY_CONNECT_TIMEOUT: Duration = Duration::from_millis(1_000);
/// How long the relay waits for the worker's status before assuming it is running.
pub const RELAY_RESPONSE_TIMEOUT: Duration = Duration::from_millis(1_500);
/// Time the relay needs after connecting to write the job before it gives up.
pub const RELAY_SEND_WINDOW: Duration = Duration::from_millis(100);

/// Starts a job. Returning `Ok` means the job is out of the caller's hands.
///
/// Callers must not cancel a dispatch once it has started: a job that reached
/// the worker is owned by it. `budget` is how long the caller can wait, and the
/// dispatcher decides within it whether the job started.
#[async_trait]
pub trait JobDispatcher: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    ///
    /// `DispatchFailed` when the job could not be started.
    async fn dispatch(&self, job: JobPayload, budget: Duration) -> Result<(), JobError>;
}

/// Runs the continuation as a detached task in this process.
pub struct DetachedTask {
    continuation: Arc<Continuation>,
}

impl DetachedTask {
    #[must_use]
    pub fn new(continuation: Arc<Continuation>) -> Self {
        Self { continuation }
    }
}

#[async_trait]
impl JobDispatcher for DetachedTask {
    fn name(&self) -> &'static str {
        "in_process"
    }

    async fn dispatch(&self, job: JobPayload, _budget: Duration) -> Result<(), JobError> {
        let continuation = Arc::clone(&self.continuation);
        info!(job_id = %job.job_id, "Continuation spawned");
        tokio::spawn(async move {
            let job_id = job.job_id.clone();
            // Already delivered and logged by the continuation.
            if let Err(e) = continuation.run(job).await {
                debug!(job_id = %job_id, code = e.code(), "Detached job ended without a summary");
            }
        });
        Ok(())
    }
}

/// Hands the job to a separate worker with one signed, fire-and-forget POST.
pub struct HttpRelay {
    http: HttpClient,
    worker_url: String,
    secret: String,
    connect_timeout: Duration,
    response_timeout: Duration,
}

impl HttpRelay {
    /// # Errors
    ///
    /// `DispatchFailed` if the HTTP client cannot be built.
    pub fn new(worker_url: String, secret: String) -> Result<Self, JobError> {
        Self::with_timeouts(worker_url, secret, RELAY_CONNECT_TIMEOUT, RELAY_RESPONSE_TIMEOUT)
    }

    /// # Errors
    ///
    /// `DispatchFailed` if the HTTP client cannot be built.
    pub fn with_timeouts(
        worker_url: String,
        secret: String,
        connect_timeout: Duration,
        response_timeout: Duration,
    ) -> Result<Self, JobError> {
        let http = HttpClient::builder()
            .connect_timeout(connect_timeout)
            .timeout(response_timeout)
            .build()
            .map_err(|e| JobError::DispatchFailed(format!("relay client: {e}")))?;
        Ok(Self {
            http,
            worker_url,
            secret,
            connect_timeout,
            response_timeout,
        })
    }

    /// Shortest budget in which a send can still tell a refused connection
    /// from a worker that is busy with the job.
    #[must_use]
    pub fn min_budget(&self) -> Duration {
        self.connect_timeout + RELAY_SEND_WINDOW
    }
}

#[async_trait]
impl JobDispatcher for HttpRelay {
    fn name(&self) -> &'static str {
        "relay"
    }

    async fn dispatch(&self, job: JobPayload, budget: Duration) -> Result<(), JobError> {
        // Once written, the job belongs to the worker, so never start a send
        // that could be cut short before the connection is known good.
        if budget < self.min_budget() {
            warn!(
                job_id = %job.job_id,
                budget_ms = budget.as_millis(),
                "Not enough time left to relay the job"
            );
            return Err(JobError::DispatchFailed(
                "not enough time left to start the job".to_string(),
            ));
        }

        let body = serde_json::to_string(&job)
            .map_err(|e| JobError::DispatchFailed(format!("serialize job: {e}")))?;
        let timestamp = Utc::now().timestamp().to_string();
        let signature = compute_signature(&timestamp, &body, &self.secret);

        let sent = self
            .http
            .post(&self.worker_url)
            .header(CONTENT_TYPE, "application/json")
            .header(RELAY_TIMESTAMP_HEADER, timestamp)
            .header(RELAY_SIGNATURE_HEADER, signature)
            .timeout(budget.min(self.response_timeout))
            .body(body)
            .send()
            .await;

        match sent {
            Ok(resp) if resp.status().is_success() => {
                info!(job_id = %job.job_id, status = %resp.status(), "Job relayed to worker");
                Ok(())
            }
            Ok(resp) => Err(JobError::DispatchFailed(format!(
                "worker answered HTTP {}",
                resp.status()
            ))),
            // Connected and sent, but the worker is still busy: the job is in flight.
            Err(e) if e.is_timeout() && !e.is_connect() => {
                warn!(job_id = %job.job_id, "Worker did not answer in time; assuming job is running");
                Ok(())
            }
            Err(e) => Err(JobError::DispatchFailed(format!(
                "worker unreachable: {}",
                e.without_url()
            ))),
        }
    }
}
