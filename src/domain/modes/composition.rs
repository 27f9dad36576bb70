//! Response composition across mode segments.
//!
//! Joins per-segment generated text into one reply, in segment order, with
//! a transition phrase wherever the mode changes.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use crate::domain::conversation::ConversationMode;
use crate::domain::foundation::ValidationError;

/// How mode changes are announced in a composed reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransitionStyle {
    #[default]
    Natural,
    Explicit,
    Minimal,
}

impl FromStr for TransitionStyle {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "natural" => Ok(Self::Natural),
            "explicit" => Ok(Self::Explicit),
            "minimal" => Ok(Self::Minimal),
            other => Err(ValidationError::invalid_format(
                "transition_style",
                format!("unknown style '{other}'"),
            )),
        }
    }
}

type PhraseTable = HashMap<(ConversationMode, ConversationMode), &'static str>;

static NATURAL_PHRASES: Lazy<PhraseTable> = Lazy::new(|| {
    use ConversationMode::*;
    HashMap::from([
        ((Smalltalk, Consult), "Now, to your question:"),
        ((Meta, Consult), "Back to your question:"),
        ((Consult, Smalltalk), "On a lighter note,"),
        ((Meta, Smalltalk), "Otherwise,"),
        ((Consult, Meta), "As for how I work:"),
        ((Smalltalk, Meta), "As for me:"),
    ])
});

static EXPLICIT_PHRASES: Lazy<HashMap<ConversationMode, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (ConversationMode::Consult, "Switching to advice:"),
        (ConversationMode::Smalltalk, "Switching to casual chat:"),
        (ConversationMode::Meta, "Switching to questions about me:"),
    ])
});

/// Transition settings for composing a reply.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionConfig {
    pub style: TransitionStyle,
    /// Placed between consecutive segment texts.
    pub separator: String,
    /// Per (from, to) phrases that replace the built-in ones.
    pub overrides: HashMap<(ConversationMode, ConversationMode), String>,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            style: TransitionStyle::Natural,
            separator: "\n\n".to_string(),
            overrides: HashMap::new(),
        }
    }
}

impl TransitionConfig {
    pub fn with_style(mut self, style: TransitionStyle) -> Self {
        self.style = style;
        self
    }

    pub fn with_override(
        mut self,
        from: ConversationMode,
        to: ConversationMode,
        phrase: impl Into<String>,
    ) -> Self {
        self.overrides.insert((from, to), phrase.into());
        self
    }

    /// Phrase to insert when moving from one mode to another, if any.
    pub fn phrase_for(&self, from: ConversationMode, to: ConversationMode) -> Option<&str> {
        if from == to || self.style == TransitionStyle::Minimal {
            return None;
        }
        if let Some(phrase) = self.overrides.get(&(from, to)) {
            return Some(phrase.as_str());
        }
        match self.style {
            TransitionStyle::Natural => NATURAL_PHRASES.get(&(from, to)).copied(),
            TransitionStyle::Explicit => EXPLICIT_PHRASES.get(&to).copied(),
            TransitionStyle::Minimal => None,
        }
    }
}

/// Generated text for one segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentOutput {
    pub mode: ConversationMode,
    pub text: String,
}

impl SegmentOutput {
    pub fn new(mode: ConversationMode, text: impl Into<String>) -> Self {
        Self {
            mode,
            text: text.into(),
        }
    }
}

/// Compose one reply from ordered segment outputs.
///
/// Blank texts are skipped; the mode of the previous non-blank segment
/// decides whether a transition phrase is needed.
pub fn compose_response(outputs: &[SegmentOutput], config: &TransitionConfig) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(outputs.len());
    let mut previous: Option<ConversationMode> = None;

    for output in outputs {
        let text = output.text.trim();
        if text.is_empty() {
            continue;
        }
        let part = match previous.and_then(|from| config.phrase_for(from, output.mode)) {
            Some(phrase) => format!("{phrase} {text}"),
            None => text.to_string(),
        };
        parts.push(part);
        previous = Some(output.mode);
    }

    parts.join(&config.separator)
}
