//! HTTP transport for the task API.
//!
//! One `reqwest` client is built at startup with the request timeout and
//! an optional proxy, then reused for every call. Non-2xx statuses are
//! data (`ApiResponse.status`), not errors; only failures below the HTTP
//! status level surface as `TransportError`.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::header::{
    HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE, ORIGIN, REFERER, USER_AGENT,
};
use serde_json::Value;
use thiserror::Error;
use tracing::trace;

use dva_core::{RequestId, RequestRecord};

use crate::config::Config;
use crate::store::RequestHistory;

const RATELIMIT_REMAINING_HEADER: &str = "x-ratelimit-remaining";

/// Transport-level failures: connect errors, timeouts, bad proxy config.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,

    #[error("transport failure: {0}")]
    Transport(String),

    #[error("invalid proxy '{0}'")]
    Proxy(String),

    #[error("invalid header value: {0}")]
    Header(String),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout
        } else {
            Self::Transport(e.to_string())
        }
    }
}

/// Response surfaced to callers.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
    /// Quota reported via `x-ratelimit-remaining`, when present.
    pub ratelimit_remaining: Option<i64>,
}

impl ApiResponse {
    /// Whether the call succeeded at the HTTP level.
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }

    /// Parse the body as JSON. An empty body parses as an empty object,
    /// matching the wire behavior of successful-but-bodyless responses.
    pub fn json(&self) -> Result<Value, serde_json::Error> {
        if self.body.trim().is_empty() {
            Ok(Value::Object(serde_json::Map::new()))
        } else {
            serde_json::from_str(&self.body)
        }
    }
}

/// Issues authenticated requests against the task API.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn get(&self, url: &str, request_id: &RequestId)
        -> Result<ApiResponse, TransportError>;

    async fn patch(
        &self,
        url: &str,
        request_id: &RequestId,
        body: &Value,
    ) -> Result<ApiResponse, TransportError>;

    async fn post(
        &self,
        url: &str,
        request_id: &RequestId,
        body: &Value,
    ) -> Result<ApiResponse, TransportError>;
}

/// `reqwest`-backed transport. Adds the wire headers (bearer auth plus the
/// `x-gata-*` fingerprint headers), applies the configured proxy and
/// timeout, captures the rate-limit header, and appends every call to the
/// shared request history.
pub struct HttpTransport {
    client: reqwest::Client,
    config: Arc<Config>,
    history: Arc<RequestHistory>,
}

impl HttpTransport {
    /// Build the client once; it is reused across all calls.
    pub fn new(config: Arc<Config>, history: Arc<RequestHistory>) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder().timeout(config.request_timeout);
        if let Some(proxy) = config.random_proxy() {
            let proxy = reqwest::Proxy::all(proxy)
                .map_err(|_| TransportError::Proxy(proxy.to_string()))?;
            builder = builder.proxy(proxy);
        }
        let client = builder.build()?;
        Ok(Self {
            client,
            config,
            history,
        })
    }

    fn headers(&self, request_id: &RequestId) -> Result<HeaderMap, TransportError> {
        let header = |value: &str| {
            HeaderValue::from_str(value).map_err(|e| TransportError::Header(e.to_string()))
        };

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ORIGIN, HeaderValue::from_static("https://app.gata.xyz"));
        headers.insert(REFERER, HeaderValue::from_static("https://app.gata.xyz/"));
        headers.insert(USER_AGENT, header(&self.config.user_agent())?);
        headers.insert(
            AUTHORIZATION,
            header(&format!("Bearer {}", self.config.bearer_token))?,
        );
        headers.insert("x-gata-endpoint", HeaderValue::from_static("pc-browser"));
        headers.insert("x-gata-request-id", header(request_id.as_str())?);
        headers.insert(
            "x-gata-timestamp",
            header(&Utc::now().timestamp().to_string())?,
        );
        Ok(headers)
    }

    async fn execute(
        &self,
        request: reqwest::RequestBuilder,
        url: &str,
        request_id: &RequestId,
    ) -> Result<ApiResponse, TransportError> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let ratelimit_remaining = response
            .headers()
            .get(RATELIMIT_REMAINING_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse().ok());
        let body = response.text().await?;

        trace!(url = %url, request_id = %request_id, status = status, "Request completed");
        self.history
            .record(RequestRecord::new(request_id, url, status));

        Ok(ApiResponse {
            status,
            body,
            ratelimit_remaining,
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(
        &self,
        url: &str,
        request_id: &RequestId,
    ) -> Result<ApiResponse, TransportError> {
        let request = self.client.get(url).headers(self.headers(request_id)?);
        self.execute(request, url, request_id).await
    }

    async fn patch(
        &self,
        url: &str,
        request_id: &RequestId,
        body: &Value,
    ) -> Result<ApiResponse, TransportError> {
        let request = self
            .client
            .patch(url)
            .headers(self.headers(request_id)?)
            .json(body);
        self.execute(request, url, request_id).await
    }

    async fn post(
        &self,
        url: &str,
        request_id: &RequestId,
        body: &Value,
    ) -> Result<ApiResponse, TransportError> {
        let request = self
            .client
            .post(url)
            .headers(self.headers(request_id)?)
            .json(body);
        self.execute(request, url, request_id).await
    }
}
