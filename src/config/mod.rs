//! Application configuration module
//!
//! Type-safe configuration loading from environment variables using the
//! `config` and `dotenvy` crates. Variables use the `DIALOG_ORCHESTRATOR`
//! prefix and nested values are separated by double underscores. Every
//! section has defaults, so an empty environment yields a working setup.
//!
//! # Example
//!
//! ```no_run
//! use dialog_orchestrator::config::{init_tracing, AppConfig};
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//! init_tracing(&config.logging);
//! ```

mod agent_state;
mod composition;
mod conversation;
mod error;
mod logging;
mod steering;

pub use agent_state::AgentStateConfig;
pub use composition::{CompositionConfig, TransitionOverride};
pub use conversation::ConversationConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{init_tracing, LoggingConfig};
pub use steering::SteeringConfig;

use serde::Deserialize;
use std::path::Path;

const ENV_PREFIX: &str = "DIALOG_ORCHESTRATOR";

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Agent state TTL and sweep settings
    #[serde(default)]
    pub agent_state: AgentStateConfig,

    /// Steering merge limits, collision policy and timeouts
    #[serde(default)]
    pub steering: SteeringConfig,

    /// Transition style for multi-mode replies
    #[serde(default)]
    pub composition: CompositionConfig,

    /// History window and data directory
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// Tracing output
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `DIALOG_ORCHESTRATOR` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `DIALOG_ORCHESTRATOR__STEERING__MAX_HINT_SETS=5` -> `steering.max_hint_sets = 5`
    /// - `DIALOG_ORCHESTRATOR__LOGGING__JSON=true` -> `logging.json = true`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Load a configuration file, with environment variables layered on top.
    ///
    /// The format follows the file extension (YAML, TOML or JSON).
    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::from(path.as_ref()))
            .add_source(environment())
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.agent_state.validate()?;
        self.steering.validate()?;
        self.conversation.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

fn environment() -> config::Environment {
    config::Environment::default()
        .prefix(ENV_PREFIX)
        .separator("__")
}
