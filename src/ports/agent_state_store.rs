//! Agent State Store Port - TTL-bounded working memory for domain plugins.
//!
//! Records are keyed by (conversation, domain, state type). Saving a record
//! supersedes the previous active record of the same tuple; superseded and
//! expired records stay invisible to readers until the background sweep
//! deletes them.

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::agent_state::AgentState;
use crate::domain::foundation::{AgentStateId, ConversationId, ValidationError};

/// Errors that can occur during agent state operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AgentStateError {
    #[error("Invalid agent state: {0}")]
    Validation(#[from] ValidationError),

    #[error("Agent state store unavailable: {0}")]
    Unavailable(String),
}

/// Port for per-conversation agent state with expiry.
#[async_trait]
pub trait AgentStateStore: Send + Sync {
    /// Create a new active record expiring `ttl_secs` from now.
    ///
    /// Any prior active record for the same tuple is superseded.
    async fn save_state(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: &str,
        data: Value,
        ttl_secs: u64,
    ) -> Result<AgentStateId, AgentStateError>;

    /// Current active record, with id and timestamps.
    ///
    /// Without a state type, the most recently created active record in the
    /// (conversation, domain) scope is returned.
    async fn get_state_with_metadata(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: Option<&str>,
    ) -> Result<Option<AgentState>, AgentStateError>;

    /// Payload of the current active record.
    async fn get_state(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: Option<&str>,
    ) -> Result<Option<Value>, AgentStateError> {
        Ok(self
            .get_state_with_metadata(conversation_id, domain_id, state_type)
            .await?
            .map(|record| record.data))
    }

    /// Mark a record resolved.
    ///
    /// Resolving twice is a no-op. Returns false if the id is unknown.
    async fn resolve_state(&self, id: AgentStateId) -> Result<bool, AgentStateError>;

    /// Shallow-merge `updates` into the active record and save the result as
    /// a new record superseding it.
    ///
    /// With `ttl_secs` omitted the new record keeps the original lifetime.
    /// Returns false if no active record existed.
    async fn update_state(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: &str,
        updates: Value,
        ttl_secs: Option<u64>,
    ) -> Result<bool, AgentStateError>;

    /// Remove every record of a conversation, active or not.
    async fn clear_conversation_states(
        &self,
        conversation_id: ConversationId,
    ) -> Result<usize, AgentStateError>;

    /// Permanently delete records whose expiry has passed, resolved or not.
    async fn purge_expired(&self) -> Result<usize, AgentStateError>;

    /// Number of stored records, including inactive ones.
    async fn record_count(&self) -> Result<usize, AgentStateError>;
}
