//! Error types for steering strategies.

use thiserror::Error;

/// Failure of a single steering strategy.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SteeringError {
    #[error("Strategy '{strategy_id}' failed to generate hints: {reason}")]
    GenerationFailed { strategy_id: String, reason: String },

    #[error("Strategy '{strategy_id}' timed out after {timeout_ms}ms")]
    Timeout { strategy_id: String, timeout_ms: u64 },

    #[error("Strategy '{strategy_id}' panicked")]
    Panicked { strategy_id: String },
}

impl SteeringError {
    /// Creates a generation failure for a strategy.
    pub fn generation_failed(strategy_id: impl Into<String>, reason: impl Into<String>) -> Self {
        SteeringError::GenerationFailed {
            strategy_id: strategy_id.into(),
            reason: reason.into(),
        }
    }

    /// The strategy the error belongs to.
    pub fn strategy_id(&self) -> &str {
        match self {
            SteeringError::GenerationFailed { strategy_id, .. }
            | SteeringError::Timeout { strategy_id, .. }
            | SteeringError::Panicked { strategy_id } => strategy_id,
        }
    }
}
