//! Task acquisition: polls the task endpoint for the next unit of work.

use std::sync::Arc;

use tracing::{debug, info, warn};

use dva_core::{RequestId, Task};

use crate::config::Config;
use crate::transport::Transport;

/// Polls for the next available task. In the observed protocol the server
/// hands out at most one outstanding task at a time.
pub struct TaskFetcher {
    transport: Arc<dyn Transport>,
    config: Arc<Config>,
}

impl TaskFetcher {
    pub fn new(transport: Arc<dyn Transport>, config: Arc<Config>) -> Self {
        Self { transport, config }
    }

    /// Fetch the next available tasks.
    ///
    /// An empty queue, a non-200 status, a transport failure, or an
    /// unparsable body all yield an empty list; none of these are errors
    /// at this level. Candidates missing required fields are dropped.
    pub async fn fetch_next(&self) -> Vec<Task> {
        let request_id = RequestId::generate();

        let response = match self
            .transport
            .get(&self.config.endpoints.task, &request_id)
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Task fetch failed");
                return Vec::new();
            }
        };

        if !response.is_ok() {
            debug!(
                request_id = %request_id,
                status = response.status,
                "Task endpoint returned non-200"
            );
            return Vec::new();
        }

        let body = match response.json() {
            Ok(body) => body,
            Err(e) => {
                warn!(request_id = %request_id, error = %e, "Task response body unparsable");
                return Vec::new();
            }
        };

        let tasks = Task::from_response(&body);
        if tasks.is_empty() {
            debug!(request_id = %request_id, "No tasks available");
        } else {
            info!(request_id = %request_id, count = tasks.len(), "Fetched tasks");
        }
        tasks
    }

    /// Lightweight health probe: a bare GET against the task endpoint.
    /// Any non-200 status or transport failure counts as unhealthy.
    pub async fn probe_health(&self) -> bool {
        let request_id = RequestId::generate();
        match self
            .transport
            .get(&self.config.endpoints.task, &request_id)
            .await
        {
            Ok(response) => response.is_ok(),
            Err(e) => {
                warn!(error = %e, "Health probe failed");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{response, test_config, MockTransport};
    use crate::transport::TransportError;

    #[tokio::test]
    async fn test_yields_one_task_from_single_object() {
        let transport = MockTransport::new(vec![Ok(response(
            200,
            r#"{"id":"t1","link":"http://x/i.jpg","text":"cap"}"#,
        ))]);
        let fetcher = TaskFetcher::new(transport.clone(), test_config());

        let tasks = fetcher.fetch_next().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_str(), "t1");
        assert_eq!(transport.calls(), 1);
    }

    #[tokio::test]
    async fn test_filters_incomplete_candidates() {
        let transport = MockTransport::new(vec![Ok(response(
            200,
            r#"[{"id":"t1","link":"http://x/a.jpg","text":"one"},
                {"id":"t2","link":"","text":"two"},
                {"id":"t3","text":"three"}]"#,
        ))]);
        let fetcher = TaskFetcher::new(transport, test_config());

        let tasks = fetcher.fetch_next().await;
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].id.as_str(), "t1");
    }

    #[tokio::test]
    async fn test_non_200_yields_empty() {
        let transport = MockTransport::new(vec![Ok(response(503, ""))]);
        let fetcher = TaskFetcher::new(transport, test_config());
        assert!(fetcher.fetch_next().await.is_empty());
    }

    #[tokio::test]
    async fn test_transport_failure_yields_empty() {
        let transport = MockTransport::new(vec![Err(TransportError::Timeout)]);
        let fetcher = TaskFetcher::new(transport, test_config());
        assert!(fetcher.fetch_next().await.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_body_yields_empty() {
        let transport = MockTransport::new(vec![Ok(response(200, "{not json"))]);
        let fetcher = TaskFetcher::new(transport, test_config());
        assert!(fetcher.fetch_next().await.is_empty());
    }

    #[tokio::test]
    async fn test_probe_health() {
        let transport = MockTransport::new(vec![
            Ok(response(200, "[]")),
            Ok(response(500, "")),
            Err(TransportError::Timeout),
        ]);
        let fetcher = TaskFetcher::new(transport, test_config());
        assert!(fetcher.probe_health().await);
        assert!(!fetcher.probe_health().await);
        assert!(!fetcher.probe_health().await);
    }
}
