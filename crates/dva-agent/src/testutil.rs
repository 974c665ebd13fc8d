//! Shared test doubles for the agent's network-facing components.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use dva_core::{RequestId, Task};

use crate::config::{Config, Endpoints};
use crate::transport::{ApiResponse, Transport, TransportError};

/// Scripted transport: pops one queued outcome per call, counting calls
/// and remembering the last request body. When the script runs dry it
/// answers HTTP 200 with an empty task list.
pub struct MockTransport {
    responses: Mutex<VecDeque<Result<ApiResponse, TransportError>>>,
    calls: AtomicU32,
    last_body: Mutex<Option<Value>>,
}

impl MockTransport {
    pub fn new(responses: Vec<Result<ApiResponse, TransportError>>) -> Arc<Self> {
        Arc::new(Self {
            responses: Mutex::new(responses.into()),
            calls: AtomicU32::new(0),
            last_body: Mutex::new(None),
        })
    }

    /// Total network calls observed.
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }

    /// Body of the most recent PATCH/POST, if any.
    pub fn last_body(&self) -> Option<Value> {
        self.last_body.lock().unwrap().clone()
    }

    fn next(&self) -> Result<ApiResponse, TransportError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(response(200, "[]")))
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(
        &self,
        _url: &str,
        _request_id: &RequestId,
    ) -> Result<ApiResponse, TransportError> {
        self.next()
    }

    async fn patch(
        &self,
        _url: &str,
        _request_id: &RequestId,
        body: &Value,
    ) -> Result<ApiResponse, TransportError> {
        *self.last_body.lock().unwrap() = Some(body.clone());
        self.next()
    }

    async fn post(
        &self,
        _url: &str,
        _request_id: &RequestId,
        body: &Value,
    ) -> Result<ApiResponse, TransportError> {
        *self.last_body.lock().unwrap() = Some(body.clone());
        self.next()
    }
}

/// Plain response with no rate-limit header.
pub fn response(status: u16, body: &str) -> ApiResponse {
    ApiResponse {
        status,
        body: body.to_string(),
        ratelimit_remaining: None,
    }
}

/// Adds the rate-limit header value to a scripted response.
pub trait ApiResponseExt {
    fn with_ratelimit_remaining(self, remaining: i64) -> ApiResponse;
}

impl ApiResponseExt for ApiResponse {
    fn with_ratelimit_remaining(mut self, remaining: i64) -> ApiResponse {
        self.ratelimit_remaining = Some(remaining);
        self
    }
}

/// Config pointing at a dummy endpoint table, no files involved.
pub fn test_config() -> Arc<Config> {
    Arc::new(Config {
        bearer_token: "test-token".to_string(),
        proxies: Vec::new(),
        endpoints: Endpoints {
            task: "https://agent.test/api/task".to_string(),
            task_rewards: "https://agent.test/api/task_rewards".to_string(),
            my_intelligence: "https://agent.test/api/my_intelligence".to_string(),
            conversation: "https://agent.test/api/conversation".to_string(),
        },
        max_retries: 3,
        request_timeout: std::time::Duration::from_secs(30),
        health_check: false,
        chat_every_cycles: 0,
        payload_mode: dva_core::PayloadMode::default(),
        data_dir: std::env::temp_dir(),
    })
}

/// Minimal fully-populated task.
pub fn test_task() -> Task {
    Task::from_value(&json!({
        "id": "t1",
        "link": "http://x/i.jpg",
        "text": "cap"
    }))
    .expect("test task is fully populated")
}
