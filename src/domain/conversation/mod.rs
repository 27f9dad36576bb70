//! Conversation domain module.
//!
//! The conversation-state snapshot threaded through the stage pipeline and
//! the closed set of conversation modes.

mod mode;
mod state;

pub use mode::ConversationMode;
pub use state::{
    ContextElement, ConversationState, ExtractionResult, Goal, GoalStatus, MessageRole,
    TurnMessage,
};
