//! Append-only request history records.

use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::ids::RequestId;

/// One request observed on the wire. Write-only during the run; read back
/// only when the history file is flushed at shutdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestRecord {
    /// UTC timestamp of the request.
    pub timestamp: String,

    /// Fingerprint the request was sent with.
    pub request_id: String,

    /// Endpoint the request went to.
    pub endpoint: String,

    /// HTTP status of the response.
    pub status: u16,
}

impl RequestRecord {
    /// Record a completed request.
    pub fn new(request_id: &RequestId, endpoint: impl Into<String>, status: u16) -> Self {
        Self {
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            request_id: request_id.as_str().to_string(),
            endpoint: endpoint.into(),
            status,
        }
    }
}
