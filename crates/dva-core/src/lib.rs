//! DVA Core Domain Types
//!
//! This crate contains pure domain types with no dependencies on:
//! - Network/HTTP
//! - Async runtime
//! - Filesystem
//!
//! All types here represent the core protocol domain of the DVA agent:
//! tasks, submission payloads, rate-limit state, request fingerprints,
//! and the jittered backoff policy.

pub mod backoff;
pub mod error;
pub mod history;
pub mod ids;
pub mod ratelimit;
pub mod submission;
pub mod task;

// Re-export commonly used types
pub use error::CoreError;
pub use history::RequestRecord;
pub use ids::{RequestId, TaskId};
pub use ratelimit::RateLimitState;
pub use submission::{ApiCode, PayloadMode, ResultPayload, ServerResponse, SubmissionResult};
pub use task::Task;
