//! Response composition configuration

use serde::Deserialize;

use crate::domain::conversation::ConversationMode;
use crate::domain::modes::{TransitionConfig, TransitionStyle};

/// How multi-mode replies are stitched together
#[derive(Debug, Clone, Deserialize)]
pub struct CompositionConfig {
    #[serde(default)]
    pub transition_style: TransitionStyle,

    /// Text placed between segment replies
    #[serde(default = "default_separator")]
    pub separator: String,

    /// Phrases replacing the built-in ones for specific mode changes
    #[serde(default)]
    pub transition_overrides: Vec<TransitionOverride>,
}

/// Phrase used when moving from one mode to another
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TransitionOverride {
    pub from: ConversationMode,
    pub to: ConversationMode,
    pub phrase: String,
}

impl CompositionConfig {
    pub fn transition_config(&self) -> TransitionConfig {
        self.transition_overrides.iter().fold(
            TransitionConfig {
                style: self.transition_style,
                separator: self.separator.clone(),
                ..TransitionConfig::default()
            },
            |config, o| config.with_override(o.from, o.to, o.phrase.clone()),
        )
    }
}

impl Default for CompositionConfig {
    fn default() -> Self {
        Self {
            transition_style: TransitionStyle::default(),
            separator: default_separator(),
            transition_overrides: Vec::new(),
        }
    }
}

fn default_separator() -> String {
    "\n\n".to_string()
}
