//! Extraction capability of a domain plugin.

use async_trait::async_trait;

use crate::domain::conversation::{ConversationState, ExtractionResult};
use crate::ports::AgentStateStore;

use super::ExtractionError;

/// Everything an extractor may look at for one turn.
pub struct ExtractionContext<'a> {
    pub message: &'a str,
    pub state: &'a ConversationState,
    /// Short-lived multi-step state, e.g. a pending clarification.
    pub agent_state: &'a dyn AgentStateStore,
}

/// Derives structured facts from a user turn.
#[async_trait]
pub trait DomainExtractor: Send + Sync {
    /// Returns `Ok(None)` when the turn holds nothing for this domain.
    async fn extract(&self, ctx: &ExtractionContext<'_>) -> Result<Option<ExtractionResult>, ExtractionError>;
}
