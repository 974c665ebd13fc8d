//! Conversational exchange with the chat endpoint.
//!
//! Shares the submitter's bounded-retry discipline; the conversational
//! content itself is a rotating set of canned prompts.

use std::sync::Arc;

use rand::seq::SliceRandom;
use serde_json::{json, Value};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use dva_core::{backoff, RequestId};

use crate::config::Config;
use crate::submitter::SubmitError;
use crate::transport::Transport;

const PROMPTS: &[&str] = &[
    "What kinds of validation tasks are available today?",
    "How is my agent performing this session?",
    "Any tips for improving annotation accuracy?",
    "What does the current task queue look like?",
];

/// Exchanges messages with the conversation endpoint.
pub struct ChatClient {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
    cancel: CancellationToken,
}

impl ChatClient {
    pub fn new(
        transport: Arc<dyn Transport>,
        config: Arc<Config>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            transport,
            config,
            cancel,
        }
    }

    /// Canned prompt for the scheduler's periodic exchange.
    pub fn next_prompt(&self) -> &'static str {
        PROMPTS
            .choose(&mut rand::thread_rng())
            .copied()
            .unwrap_or(PROMPTS[0])
    }

    /// Send one message; failed attempts retry with jittered backoff up
    /// to the configured maximum.
    pub async fn exchange(&self, message: &str) -> Result<String, SubmitError> {
        let mut attempts = 0u32;
        let mut last_error = String::new();

        while attempts < self.config.max_retries {
            if self.cancel.is_cancelled() {
                return Err(SubmitError::Cancelled);
            }

            attempts += 1;
            let request_id = RequestId::generate();

            match self.attempt(message, &request_id).await {
                Ok(reply) => {
                    info!(request_id = %request_id, attempt = attempts, "Chat reply received");
                    return Ok(reply);
                }
                Err(error) => {
                    warn!(
                        request_id = %request_id,
                        attempt = attempts,
                        error = %error,
                        "Chat exchange failed"
                    );
                    last_error = error;
                }
            }

            if attempts < self.config.max_retries {
                let delay = backoff::retry_delay(attempts, &mut rand::thread_rng());
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

    async fn attempt(&self, message: &str, request_id: &RequestId) -> Result<String, String> {
        let body = json!({ "message": message });
        let response = self
            .transport
            .post(&self.config.endpoints.conversation, request_id, &body)
            .await
            .map_err(|e| e.to_string())?;

        if !response.is_ok() {
            return Err(format!("API error: HTTP {}", response.status));
        }

        let value = response
            .json()
            .map_err(|e| format!("malformed chat response: {e}"))?;
        value
            .get("reply")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| "chat response missing reply field".to_string())
    }
}
