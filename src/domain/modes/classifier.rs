//! Mode classification.
//!
//! Splits a user message into mode segments. The rule-based default tags
//! each sentence by keyword signals and coalesces adjacent sentences of the
//! same mode, so "Hi! How should I invest my bonus?" yields a smalltalk
//! segment followed by a consult segment.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ConversationMode, ConversationState};

/// A mode tag plus the part of the message it applies to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeSegment {
    pub mode: ConversationMode,
    pub text: String,
}

impl ModeSegment {
    pub fn new(mode: ConversationMode, text: impl Into<String>) -> Self {
        Self {
            mode,
            text: text.into(),
        }
    }
}

/// Result of classifying one user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeClassification {
    pub primary: ConversationMode,
    pub segments: Vec<ModeSegment>,
}

impl ModeClassification {
    /// Build a classification, deriving the primary mode from the segments.
    pub fn from_segments(segments: Vec<ModeSegment>, fallback: ConversationMode) -> Self {
        Self {
            primary: primary_mode(&segments, fallback),
            segments,
        }
    }

    /// True when the turn spans more than one mode.
    pub fn is_mixed(&self) -> bool {
        self.segments
            .windows(2)
            .any(|pair| pair[0].mode != pair[1].mode)
    }
}

/// Primary mode of a turn: consult if any segment asks for advice,
/// otherwise the mode of the first segment.
pub fn primary_mode(segments: &[ModeSegment], fallback: ConversationMode) -> ConversationMode {
    if segments.iter().any(|s| s.mode == ConversationMode::Consult) {
        return ConversationMode::Consult;
    }
    segments.first().map(|s| s.mode).unwrap_or(fallback)
}

/// Assigns conversation modes to a user message.
pub trait ModeClassifier: Send + Sync {
    fn classify(&self, message: &str, state: &ConversationState) -> ModeClassification;
}

static META_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "who are you",
        "what are you",
        "are you a bot",
        "are you an ai",
        "are you human",
        "what can you do",
        "how do you work",
        "your name",
        "who made you",
        "who built you",
        "do you remember",
        "what do you know about me",
        "this conversation",
    ]
});

static SMALLTALK_PHRASES: Lazy<Vec<&'static str>> = Lazy::new(|| {
    vec![
        "hi",
        "hello",
        "hey",
        "good morning",
        "good afternoon",
        "good evening",
        "how are you",
        "how's it going",
        "thanks",
        "thank you",
        "cheers",
        "bye",
        "goodbye",
        "see you",
        "lol",
        "haha",
        "nice weather",
        "have a nice day",
    ]
});

/// Keyword-driven classifier used when no other classifier is configured.
#[derive(Debug, Clone, Default)]
pub struct RuleBasedModeClassifier;

impl RuleBasedModeClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Mode of a single sentence. Meta signals win over smalltalk ones;
    /// anything unrecognised is treated as a request for advice.
    pub fn classify_sentence(&self, sentence: &str) -> ConversationMode {
        let normalized = normalize(sentence);
        if META_PHRASES.iter().any(|p| contains_phrase(&normalized, p)) {
            ConversationMode::Meta
        } else if SMALLTALK_PHRASES.iter().any(|p| contains_phrase(&normalized, p)) {
            ConversationMode::Smalltalk
        } else {
            ConversationMode::Consult
        }
    }
}

impl ModeClassifier for RuleBasedModeClassifier {
    fn classify(&self, message: &str, state: &ConversationState) -> ModeClassification {
        let mut segments: Vec<ModeSegment> = Vec::new();

        for sentence in split_sentences(message) {
            let mode = self.classify_sentence(&sentence);
            match segments.last_mut() {
                Some(last) if last.mode == mode => {
                    last.text.push(' ');
                    last.text.push_str(&sentence);
                }
                _ => segments.push(ModeSegment::new(mode, sentence)),
            }
        }

        if segments.is_empty() {
            segments.push(ModeSegment::new(state.mode, message.trim()));
        }

        ModeClassification::from_segments(segments, state.mode)
    }
}

/// Split text into trimmed sentences at `.`, `!`, `?` and line breaks.
/// Runs of terminators ("?!", "...") stay with their sentence.
pub fn split_sentences(text: &str) -> Vec<String> {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '\n' || c == '\r' {
            flush(&mut current, &mut sentences);
            continue;
        }
        current.push(c);
        if matches!(c, '.' | '!' | '?') {
            while let Some(&next) = chars.peek() {
                if matches!(next, '.' | '!' | '?') {
                    current.push(next);
                    chars.next();
                } else {
                    break;
                }
            }
            if chars.peek().map_or(true, |n| n.is_whitespace()) {
                flush(&mut current, &mut sentences);
            }
        }
    }
    flush(&mut current, &mut sentences);
    sentences
}

fn flush(current: &mut String, sentences: &mut Vec<String>) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        sentences.push(trimmed.to_string());
    }
    current.clear();
}

/// Lowercase, punctuation folded to spaces, padded so phrases match on
/// word boundaries.
fn normalize(text: &str) -> String {
    let folded: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '\'' { c } else { ' ' })
        .collect();
    let words: Vec<&str> = folded.split_whitespace().collect();
    format!(" {} ", words.join(" "))
}

fn contains_phrase(normalized: &str, phrase: &str) -> bool {
    normalized.contains(&format!(" {} ", phrase))
}
