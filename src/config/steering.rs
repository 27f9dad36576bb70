//! Steering configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::domain::steering::{ContextMergePolicy, MergeOptions};

/// Steering stage and merge settings
#[derive(Debug, Clone, Deserialize)]
pub struct SteeringConfig {
    /// Hint sets kept after sorting by priority
    #[serde(default = "default_max_hint_sets")]
    pub max_hint_sets: usize,

    /// Suggestions kept after deduplication
    #[serde(default = "default_max_suggestions")]
    pub max_suggestions: usize,

    /// How colliding context keys are resolved
    #[serde(default)]
    pub context_merge: ContextMergePolicy,

    /// Per-strategy time limit; unlimited when unset
    #[serde(default)]
    pub strategy_timeout_ms: Option<u64>,
}

impl SteeringConfig {
    pub fn merge_options(&self) -> MergeOptions {
        MergeOptions {
            max_hint_sets: self.max_hint_sets,
            max_suggestions: self.max_suggestions,
            context_policy: self.context_merge,
        }
    }

    pub fn strategy_timeout(&self) -> Option<Duration> {
        self.strategy_timeout_ms.map(Duration::from_millis)
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.max_hint_sets == 0 {
            return Err(ValidationError::InvalidMergeLimit("max_hint_sets"));
        }
        if self.max_suggestions == 0 {
            return Err(ValidationError::InvalidMergeLimit("max_suggestions"));
        }
        if self.strategy_timeout_ms == Some(0) {
            return Err(ValidationError::InvalidStrategyTimeout);
        }
        Ok(())
    }
}

impl Default for SteeringConfig {
    fn default() -> Self {
        Self {
            max_hint_sets: default_max_hint_sets(),
            max_suggestions: default_max_suggestions(),
            context_merge: ContextMergePolicy::default(),
            strategy_timeout_ms: None,
        }
    }
}

fn default_max_hint_sets() -> usize {
    3
}

fn default_max_suggestions() -> usize {
    3
}
