//! Conversation State Repository Port - Append-only snapshot persistence.
//!
//! Every turn appends a new immutable snapshot. The current state of a
//! conversation is the snapshot with the latest `created_at`.

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::{ConversationId, SnapshotId};

/// Errors that can occur during snapshot persistence
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum StorageError {
    #[error("Snapshot already stored: {0}")]
    DuplicateSnapshot(SnapshotId),

    #[error("Failed to serialize state: {0}")]
    SerializationFailed(String),

    #[error("Failed to deserialize state: {0}")]
    DeserializationFailed(String),

    #[error("IO error: {0}")]
    IoError(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// Port for persisting conversation state snapshots
#[async_trait]
pub trait ConversationStateRepository: Send + Sync {
    /// Append a snapshot
    ///
    /// # Errors
    /// Returns `StorageError::DuplicateSnapshot` if the snapshot id was
    /// already stored.
    async fn append(&self, state: &ConversationState) -> Result<(), StorageError>;

    /// Latest snapshot of a conversation, if any
    async fn latest(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationState>, StorageError>;

    /// Up to `limit` snapshots, most recent first
    async fn history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationState>, StorageError>;
}
