//! Result submission with bounded, jittered retry.

use std::sync::{Arc, Mutex};

use chrono::Utc;
use serde_json::json;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dva_core::{
    backoff, CoreError, PayloadMode, RateLimitState, RequestId, ResultPayload, ServerResponse,
    SubmissionResult, Task,
};

use crate::cipher::PayloadCipher;
use crate::config::Config;
use crate::scoring::ScoreProvider;
use crate::transport::Transport;

/// Terminal failure of a task submission.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Every attempt failed; the task is abandoned for this cycle.
    #[error("submission failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },

    /// Shutdown was requested before the next attempt could start.
    #[error("submission cancelled by shutdown")]
    Cancelled,
}

/// Submits validation results, honoring the shared rate limit and the
/// process-wide cancellation token.
///
/// Per task: `PENDING -> {ATTEMPTING -> (SUCCESS | RETRY_WAIT)}* ->
/// (DONE | FAILED)`. Each attempt gets a fresh request fingerprint.
pub struct TaskSubmitter {
    transport: Arc<dyn Transport>,
    cipher: Arc<dyn PayloadCipher>,
    scorer: Arc<dyn ScoreProvider>,
    config: Arc<Config>,
    rate_limit: Arc<Mutex<RateLimitState>>,
    cancel: CancellationToken,
    payload_mode: PayloadMode,
}

impl TaskSubmitter {
    pub fn new(
        transport: Arc<dyn Transport>,
        cipher: Arc<dyn PayloadCipher>,
        scorer: Arc<dyn ScoreProvider>,
        config: Arc<Config>,
        rate_limit: Arc<Mutex<RateLimitState>>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            cipher,
            scorer,
            config,
            rate_limit,
            cancel,
            payload_mode: PayloadMode::default(),
        }
    }

    /// Switch to the earlier echo protocol.
    pub fn with_payload_mode(mut self, mode: PayloadMode) -> Self {
        self.payload_mode = mode;
        self
    }

    /// Submit a result for `task`, retrying failed attempts with jittered
    /// backoff up to the configured maximum.
    pub async fn submit(&self, task: &Task) -> Result<ServerResponse, SubmitError> {
        let url = format!(
            "{}/{}",
            self.config.endpoints.task.trim_end_matches('/'),
            task.id
        );

        let mut attempts = 0u32;
        let mut last_error = String::new();

        while attempts < self.config.max_retries {
            if self.cancel.is_cancelled() {
                return Err(SubmitError::Cancelled);
            }

            // Shared quota is respected process-wide, before each attempt
            self.wait_for_quota().await?;

            attempts += 1;
            let request_id = RequestId::generate();
            info!(
                task_id = %task.id,
                request_id = %request_id,
                attempt = attempts,
                max = self.config.max_retries,
                "Submitting task result"
            );

            match self.attempt(task, &url, &request_id).await {
                Ok(response) => {
                    info!(
                        task_id = %task.id,
                        request_id = %request_id,
                        attempt = attempts,
                        "Submission accepted"
                    );
                    return Ok(response);
                }
                Err(error) => {
                    warn!(
                        task_id = %task.id,
                        request_id = %request_id,
                        attempt = attempts,
                        error = %error,
                        "Submission attempt failed"
                    );
                    last_error = error;
                }
            }

            if attempts < self.config.max_retries {
                let delay = backoff::retry_delay(attempts, &mut rand::thread_rng());
                info!(
                    task_id = %task.id,
                    delay_secs = delay.as_secs_f64(),
                    "Backing off before retry"
                );
                tokio::select! {
                    _ = self.cancel.cancelled() => return Err(SubmitError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Err(SubmitError::Exhausted {
            attempts,
            last_error,
        })
    }

    /// When the quota is spent, sleep until the reset time before the
    /// next attempt starts.
    async fn wait_for_quota(&self) -> Result<(), SubmitError> {
        let wait = self
            .rate_limit
            .lock()
            .unwrap()
            .wait_until_reset(Utc::now().timestamp());

        if let Some(wait) = wait {
            info!(wait_secs = wait.as_secs(), "Rate limit exhausted, waiting for reset");
            tokio::select! {
                _ = self.cancel.cancelled() => return Err(SubmitError::Cancelled),
                _ = tokio::time::sleep(wait) => {}
            }
        }
        Ok(())
    }

    /// One network attempt. Any transport failure, non-200 status,
    /// rejection sentinel, or parse failure is a retryable error.
    async fn attempt(
        &self,
        task: &Task,
        url: &str,
        request_id: &RequestId,
    ) -> Result<ServerResponse, String> {
        let plaintext = self
            .build_payload(task, request_id)
            .and_then(|payload| payload.to_plaintext())
            .map_err(|e| e.to_string())?;
        let ciphertext = self.cipher.encrypt(&plaintext).map_err(|e| e.to_string())?;
        let envelope = json!({ "data": ciphertext });

        let response = self
            .transport
            .patch(url, request_id, &envelope)
            .await
            .map_err(|e| e.to_string())?;

        // Quota header applies regardless of how the attempt is classified
        if let Some(remaining) = response.ratelimit_remaining {
            self.rate_limit.lock().unwrap().observe_remaining(remaining);
        }

        if !response.is_ok() {
            return Err(format!("API error: HTTP {}", response.status));
        }

        let body: ServerResponse = response
            .json()
            .and_then(serde_json::from_value)
            .map_err(|e| format!("malformed response body: {e}"))?;

        if body.is_rejected() {
            return Err(format!(
                "server rejected submission (code {})",
                body.code.unwrap_or_default()
            ));
        }
        Ok(body)
    }

    fn build_payload(
        &self,
        task: &Task,
        request_id: &RequestId,
    ) -> Result<ResultPayload, CoreError> {
        match self.payload_mode {
            PayloadMode::Scored => {
                let (score, confidence) = self.scorer.compute_score(task);
                Ok(ResultPayload::Scored(SubmissionResult::new(
                    score, confidence,
                )?))
            }
            PayloadMode::Echo => Ok(ResultPayload::echo(task, request_id)),
        }
    }
}
