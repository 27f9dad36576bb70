//! Agent state configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;
use crate::adapters::agent_state::AgentStateSweeperConfig;

/// Agent state store and sweeper settings
#[derive(Debug, Clone, Deserialize)]
pub struct AgentStateConfig {
    /// Seconds between background sweeps
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_secs: u64,

    /// TTL applied when a plugin does not choose one
    #[serde(default = "default_ttl")]
    pub default_ttl_secs: u64,
}

impl AgentStateConfig {
    pub fn sweeper_config(&self) -> AgentStateSweeperConfig {
        AgentStateSweeperConfig::default()
            .with_sweep_interval(Duration::from_secs(self.sweep_interval_secs))
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sweep_interval_secs == 0 {
            return Err(ValidationError::InvalidSweepInterval);
        }
        Ok(())
    }
}

impl Default for AgentStateConfig {
    fn default() -> Self {
        Self {
            sweep_interval_secs: default_sweep_interval(),
            default_ttl_secs: default_ttl(),
        }
    }
}

fn default_sweep_interval() -> u64 {
    300
}

fn default_ttl() -> u64 {
    300
}
