//! Text Generator Port - Interface for the language model collaborator.
//!
//! The orchestrator calls the generator once per planned mode segment with
//! the mode's system prompt, the ordered message history and the segment
//! text.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct EchoGenerator;
//!
//! #[async_trait]
//! impl TextGenerator for EchoGenerator {
//!     async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
//!         Ok(request.message)
//!     }
//! }
//! ```

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::conversation::{ConversationMode, MessageRole, TurnMessage};

/// Port for text generation.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate the reply text for one request.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Request for one generated reply.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    /// Mode the reply is generated for.
    pub mode: ConversationMode,
    /// Mode-specific instructions.
    pub system_prompt: String,
    /// Prior messages, oldest first.
    pub history: Vec<ChatMessage>,
    /// The text to respond to.
    pub message: String,
}

impl GenerationRequest {
    pub fn new(mode: ConversationMode, system_prompt: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            mode,
            system_prompt: system_prompt.into(),
            history: Vec::new(),
            message: message.into(),
        }
    }

    /// Sets the message history.
    pub fn with_history(mut self, history: Vec<ChatMessage>) -> Self {
        self.history = history;
        self
    }
}

/// A message in the history sent to the generator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }
}

impl From<&TurnMessage> for ChatMessage {
    fn from(message: &TurnMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Errors from text generation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Content was filtered for safety.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// Provider is unavailable.
    #[error("generator unavailable: {message}")]
    Unavailable { message: String },

    /// Provider returned nothing usable.
    #[error("empty response")]
    EmptyResponse,
}

impl GenerationError {
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    /// Whether retrying the same request may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited { .. } | Self::Unavailable { .. })
    }
}
