//! The outer fetch -> process -> wait loop.

use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use dva_core::backoff;

use crate::chat::ChatClient;
use crate::config::Config;
use crate::fetcher::TaskFetcher;
use crate::store::ResultStore;
use crate::submitter::{SubmitError, TaskSubmitter};

/// Runs cycles until cancelled: health probe, fetch, submit each task,
/// jittered waits in between. A failed cycle is logged and retried after
/// a fixed delay; only cancellation ends the loop.
pub struct Scheduler {
    fetcher: TaskFetcher,
    submitter: TaskSubmitter,
    chat: ChatClient,
    store: Arc<ResultStore>,
    config: Arc<Config>,
    cancel: CancellationToken,
    cycles: u64,
}

impl Scheduler {
    pub fn new(
        fetcher: TaskFetcher,
        submitter: TaskSubmitter,
        chat: ChatClient,
        store: Arc<ResultStore>,
        config: Arc<Config>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            fetcher,
            submitter,
            chat,
            store,
            config,
            cancel,
            cycles: 0,
        }
    }

    /// Run until the cancellation token fires.
    pub async fn run(&mut self) {
        info!("Scheduler started");

        while !self.cancel.is_cancelled() {
            if let Err(e) = self.cycle().await {
                error!(cycle = self.cycles, error = %e, "Cycle failed");
                self.wait(backoff::CYCLE_ERROR_DELAY).await;
                continue;
            }
            self.cycles += 1;
        }

        info!(cycles = self.cycles, "Scheduler stopped");
    }

    async fn cycle(&mut self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if self.config.health_check && !self.fetcher.probe_health().await {
            let wait = backoff::unhealthy_delay(&mut rand::thread_rng());
            warn!(
                wait_secs = wait.as_secs_f64(),
                "Task endpoint unhealthy, backing off"
            );
            self.wait(wait).await;
            return Ok(());
        }

        let tasks = self.fetcher.fetch_next().await;
        if tasks.is_empty() {
            let wait = backoff::idle_delay(&mut rand::thread_rng());
            debug!(wait_secs = wait.as_secs_f64(), "No work available");
            self.wait(wait).await;
            return Ok(());
        }

        for task in &tasks {
            if self.cancel.is_cancelled() {
                return Ok(());
            }

            // Courtesy delay before each submission
            self.wait(backoff::courtesy_delay(&mut rand::thread_rng()))
                .await;

            match self.submitter.submit(task).await {
                Ok(response) => {
                    self.store.push(serde_json::to_value(&response)?);
                }
                Err(SubmitError::Cancelled) => return Ok(()),
                Err(e) => {
                    // Abandoned for this cycle; the loop moves on
                    error!(task_id = %task.id, error = %e, "Task abandoned");
                }
            }
        }

        if self.config.chat_every_cycles > 0
            && self.cycles > 0
            && self.cycles % self.config.chat_every_cycles == 0
        {
            let prompt = self.chat.next_prompt();
            match self.chat.exchange(prompt).await {
                Ok(reply) => info!(reply_len = reply.len(), "Chat exchange completed"),
                Err(SubmitError::Cancelled) => return Ok(()),
                Err(e) => return Err(Box::new(e)),
            }
        }

        let wait = backoff::idle_delay(&mut rand::thread_rng());
        debug!(
            cycle = self.cycles,
            wait_secs = wait.as_secs_f64(),
            "Cycle complete"
        );
        self.wait(wait).await;
        Ok(())
    }

    /// Cancellation-aware sleep: returns early when shutdown is requested.
    async fn wait(&self, duration: Duration) {
        tokio::select! {
            _ = self.cancel.cancelled() => {}
            _ = tokio::time::sleep(duration) => {}
        }
    }
}
