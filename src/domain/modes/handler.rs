//! Mode handlers - one system-prompt builder per conversation mode.

use std::fmt::Write;

use crate::domain::conversation::{ConversationMode, ConversationState};

/// Builds the system prompt a mode uses for the current state.
pub trait SystemPromptBuilder {
    fn build_system_prompt(&self, state: &ConversationState) -> String;
}

const CONSULT_BASE: &str = r#"You are a careful advisor. Answer the user's question directly,
ground your advice in what you know about their situation, and say so when
you need more information before recommending anything."#;

const SMALLTALK_BASE: &str = r#"You are a friendly conversation partner. Keep replies short and warm.
Do not give advice unless the user asks for it."#;

const META_BASE: &str = r#"You are answering questions about yourself and this conversation.
Be honest about being an assistant, describe what you can help with, and
summarize what you remember only from the information below."#;

/// Advisory mode. Surfaces goals, recent context, extractions and steering.
#[derive(Debug, Clone)]
pub struct ConsultHandler {
    pub max_context_elements: usize,
}

impl Default for ConsultHandler {
    fn default() -> Self {
        Self {
            max_context_elements: 5,
        }
    }
}

impl SystemPromptBuilder for ConsultHandler {
    fn build_system_prompt(&self, state: &ConversationState) -> String {
        let mut prompt = String::from(CONSULT_BASE);

        let goals: Vec<&str> = state.active_goals().map(|g| g.description.as_str()).collect();
        if !goals.is_empty() {
            prompt.push_str("\n\nThe user's active goals:");
            for goal in goals {
                let _ = write!(prompt, "\n- {goal}");
            }
        }

        let skip = state
            .context_elements
            .len()
            .saturating_sub(self.max_context_elements);
        let recent: Vec<_> = state.context_elements.iter().skip(skip).collect();
        if !recent.is_empty() {
            prompt.push_str("\n\nRecent context:");
            for element in recent {
                let _ = write!(prompt, "\n- {}: {}", element.key, element.value);
            }
        }

        let mut domains: Vec<&String> = state.extractions.keys().collect();
        domains.sort();
        let latest: Vec<_> = domains
            .into_iter()
            .filter_map(|d| state.latest_extraction(d))
            .collect();
        if !latest.is_empty() {
            prompt.push_str("\n\nWhat the user has shared, by topic:");
            for extraction in latest {
                let _ = write!(prompt, "\n- {}: {}", extraction.domain_id, extraction.data);
            }
        }

        if let Some(hints) = state.steering_hints.as_ref().filter(|h| !h.is_empty()) {
            prompt.push_str("\n\nSteer the conversation toward:");
            for suggestion in &hints.suggestions {
                let _ = write!(prompt, "\n- {suggestion}");
            }
        }

        prompt
    }
}

/// Casual mode.
#[derive(Debug, Clone, Default)]
pub struct SmalltalkHandler;

impl SystemPromptBuilder for SmalltalkHandler {
    fn build_system_prompt(&self, _state: &ConversationState) -> String {
        SMALLTALK_BASE.to_string()
    }
}

/// Self-referential mode.
#[derive(Debug, Clone, Default)]
pub struct MetaHandler;

impl SystemPromptBuilder for MetaHandler {
    fn build_system_prompt(&self, state: &ConversationState) -> String {
        let mut prompt = String::from(META_BASE);
        let _ = write!(
            prompt,
            "\n\nThis conversation has {} messages, {} active goals and notes on {} topics.",
            state.message_history.len(),
            state.active_goals().count(),
            state.extractions.len()
        );
        prompt
    }
}

/// Closed set of mode handlers.
#[derive(Debug, Clone)]
pub enum ModeHandler {
    Consult(ConsultHandler),
    Smalltalk(SmalltalkHandler),
    Meta(MetaHandler),
}

impl ModeHandler {
    /// Default handler for a mode.
    pub fn for_mode(mode: ConversationMode) -> Self {
        match mode {
            ConversationMode::Consult => Self::Consult(ConsultHandler::default()),
            ConversationMode::Smalltalk => Self::Smalltalk(SmalltalkHandler),
            ConversationMode::Meta => Self::Meta(MetaHandler),
        }
    }

    pub fn mode(&self) -> ConversationMode {
        match self {
            Self::Consult(_) => ConversationMode::Consult,
            Self::Smalltalk(_) => ConversationMode::Smalltalk,
            Self::Meta(_) => ConversationMode::Meta,
        }
    }
}

impl SystemPromptBuilder for ModeHandler {
    fn build_system_prompt(&self, state: &ConversationState) -> String {
        match self {
            Self::Consult(h) => h.build_system_prompt(state),
            Self::Smalltalk(h) => h.build_system_prompt(state),
            Self::Meta(h) => h.build_system_prompt(state),
        }
    }
}
