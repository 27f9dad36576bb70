//! Conversation configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Conversation memory and storage settings
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Messages kept in each snapshot's history
    #[serde(default = "default_history_window")]
    pub history_window: usize,

    /// Root directory for file-backed storage
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl ConversationConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.history_window == 0 {
            return Err(ValidationError::InvalidHistoryWindow);
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            history_window: default_history_window(),
            data_dir: default_data_dir(),
        }
    }
}

fn default_history_window() -> usize {
    20
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ConversationConfig::default();
        assert_eq!(config.history_window, 20);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn zero_window_is_rejected() {
        let config = ConversationConfig {
            history_window: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::InvalidHistoryWindow));
    }
}
