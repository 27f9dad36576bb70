//! Conversation modes.
//!
//! A conversation is always in exactly one mode; each mode is backed by a
//! handler that knows how to build the system prompt for it.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::foundation::ValidationError;

/// Behavioral stance of the assistant for a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationMode {
    /// Advisory stance: domain facts, goals and steering drive the reply.
    #[default]
    Consult,
    /// Casual small talk.
    Smalltalk,
    /// Questions about the assistant itself.
    Meta,
}

impl ConversationMode {
    /// All modes in declaration order.
    pub const ALL: [ConversationMode; 3] = [Self::Consult, Self::Smalltalk, Self::Meta];

    /// Stable lowercase name used in configuration and logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Consult => "consult",
            Self::Smalltalk => "smalltalk",
            Self::Meta => "meta",
        }
    }
}

impl fmt::Display for ConversationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "consult" | "advisory" => Ok(Self::Consult),
            "smalltalk" | "casual" => Ok(Self::Smalltalk),
            "meta" | "self_referential" => Ok(Self::Meta),
            other => Err(ValidationError::invalid_format(
                "mode",
                format!("unknown conversation mode '{}'", other),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mode_is_consult() {
        assert_eq!(ConversationMode::default(), ConversationMode::Consult);
    }

    #[test]
    fn parses_names_and_aliases() {
        assert_eq!("consult".parse::<ConversationMode>().unwrap(), ConversationMode::Consult);
        assert_eq!("Advisory".parse::<ConversationMode>().unwrap(), ConversationMode::Consult);
        assert_eq!("casual".parse::<ConversationMode>().unwrap(), ConversationMode::Smalltalk);
        assert_eq!(" meta ".parse::<ConversationMode>().unwrap(), ConversationMode::Meta);
        assert!("poetry".parse::<ConversationMode>().is_err());
    }

    #[test]
    fn display_matches_serde_name() {
        for mode in ConversationMode::ALL {
            let json = serde_json::to_string(&mode).unwrap();
            assert_eq!(json, format!("\"{}\"", mode));
        }
    }
}
