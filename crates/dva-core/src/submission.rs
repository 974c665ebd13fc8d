//! Submission payloads and server response classification.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::ids::RequestId;
use crate::task::Task;

/// Scoring payload submitted for a task. Created fresh per task at
/// submission time and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubmissionResult {
    /// Validation score in [-1.0, 1.0].
    pub score: f64,

    /// Confidence in the score, in [0.5, 1.0].
    pub confidence: f64,

    /// Epoch seconds, as a string.
    pub timestamp: String,
}

impl SubmissionResult {
    /// Build a result, validating the score and confidence ranges.
    pub fn new(score: f64, confidence: f64) -> Result<Self, CoreError> {
        if !(-1.0..=1.0).contains(&score) {
            return Err(CoreError::ScoreOutOfRange(score));
        }
        if !(0.5..=1.0).contains(&confidence) {
            return Err(CoreError::ConfidenceOutOfRange(confidence));
        }
        Ok(Self {
            score,
            confidence,
            timestamp: Utc::now().timestamp().to_string(),
        })
    }
}

/// Plaintext that goes into the encrypted submission envelope.
///
/// `Scored` is the current protocol; `Echo` is the earlier variant that
/// reflected the task data back to the server.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ResultPayload {
    Scored(SubmissionResult),
    Echo {
        image_url: String,
        caption: String,
        timestamp: String,
        request_id: String,
    },
}

impl ResultPayload {
    /// Echo payload from the task under submission.
    pub fn echo(task: &Task, request_id: &RequestId) -> Self {
        Self::Echo {
            image_url: task.media_link.clone(),
            caption: task.text.clone(),
            timestamp: Utc::now().format("%Y-%m-%d %H:%M:%S").to_string(),
            request_id: request_id.as_str().to_string(),
        }
    }

    /// Serialize to the plaintext JSON string handed to the cipher.
    pub fn to_plaintext(&self) -> Result<String, CoreError> {
        serde_json::to_string(self).map_err(|e| CoreError::Serialization(e.to_string()))
    }
}

/// Which plaintext goes into the encrypted envelope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PayloadMode {
    /// Current protocol: score/confidence/timestamp.
    #[default]
    Scored,
    /// Earlier protocol: echo the task data back to the server.
    Echo,
}

/// Application-level result code carried in a submission response body.
///
/// The remote API's full code taxonomy is unknown; `1002` is the one
/// observed failure sentinel, everything else unrecognized lands in
/// `Other`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiCode {
    /// Success.
    Ok,
    /// Invalid argument - the submission was rejected.
    InvalidArgument,
    /// Unrecognized code.
    Other(i64),
}

impl ApiCode {
    /// Classify a raw code value.
    pub fn from_raw(code: i64) -> Self {
        match code {
            0 => Self::Ok,
            1002 => Self::InvalidArgument,
            other => Self::Other(other),
        }
    }

    /// Whether this code marks the submission as failed even though the
    /// transport succeeded.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::InvalidArgument)
    }
}

/// Parsed body of a submission response. Everything beyond `code` is kept
/// verbatim for the results file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ServerResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ServerResponse {
    /// Classified application-level code, if the body carried one.
    pub fn api_code(&self) -> Option<ApiCode> {
        self.code.map(ApiCode::from_raw)
    }

    /// HTTP 200 with this body still counts as a failed attempt when the
    /// code is a failure sentinel.
    pub fn is_rejected(&self) -> bool {
        self.api_code().is_some_and(|c| c.is_failure())
    }
}
