//! Identifier newtypes for tasks and request fingerprints.

use std::fmt;

use chrono::Utc;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Unique identifier for a fetched task. Opaque, assigned by the server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new TaskId from a string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume and return the inner string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for TaskId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for TaskId {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

/// Request fingerprint sent with every call, used for log correlation and
/// as an idempotency hint to the server.
///
/// Derived from the current UTC timestamp plus 8 random bytes, hashed with
/// SHA-256 and truncated to 16 hex characters. Truncation trades collision
/// margin for a header-friendly length; the random salt keeps fingerprints
/// unique even within the same second.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(String);

impl RequestId {
    /// Create a RequestId from an existing string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh fingerprint.
    pub fn generate() -> Self {
        let mut salt = [0u8; 8];
        rand::thread_rng().fill_bytes(&mut salt);

        let stamp = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let mut hasher = Sha256::new();
        hasher.update(stamp.as_bytes());
        hasher.update(hex::encode(salt).as_bytes());
        let digest = hex::encode(hasher.finalize());

        Self(digest[..16].to_string())
    }

    /// Get the inner string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
