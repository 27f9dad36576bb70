//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Sweep interval must be at least one second")]
    InvalidSweepInterval,

    #[error("History window must keep at least one message")]
    InvalidHistoryWindow,

    #[error("Merge limit {0} must be at least one")]
    InvalidMergeLimit(&'static str),

    #[error("Strategy timeout must be positive when set")]
    InvalidStrategyTimeout,

    #[error("Invalid log filter: {0}")]
    InvalidLogFilter(String),
}
