//! Core domain errors.

use thiserror::Error;

/// Core domain errors for the DVA agent.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Score outside the valid [-1.0, 1.0] range.
    #[error("score {0} outside [-1.0, 1.0]")]
    ScoreOutOfRange(f64),

    /// Confidence outside the valid [0.5, 1.0] range.
    #[error("confidence {0} outside [0.5, 1.0]")]
    ConfidenceOutOfRange(f64),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(String),
}
