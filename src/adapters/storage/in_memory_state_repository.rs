//! In-Memory State Repository Adapter
//!
//! Keeps conversation snapshots in memory, ordered by creation time.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::ConversationId;
use crate::ports::{ConversationStateRepository, StorageError};

/// In-memory snapshot storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryStateRepository {
    snapshots: Arc<RwLock<HashMap<ConversationId, Vec<ConversationState>>>>,
}

impl InMemoryStateRepository {
    /// Create a new in-memory repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all stored data (useful for tests)
    pub async fn clear(&self) {
        self.snapshots.write().await.clear();
    }

    /// Total number of stored snapshots
    pub async fn snapshot_count(&self) -> usize {
        self.snapshots.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl ConversationStateRepository for InMemoryStateRepository {
    async fn append(&self, state: &ConversationState) -> Result<(), StorageError> {
        let mut snapshots = self.snapshots.write().await;
        let history = snapshots.entry(state.conversation_id).or_default();

        if history.iter().any(|s| s.id == state.id) {
            return Err(StorageError::DuplicateSnapshot(state.id));
        }

        // Kept sorted by created_at; equal timestamps stay in append order.
        let at = history.partition_point(|s| s.created_at <= state.created_at);
        history.insert(at, state.clone());
        Ok(())
    }

    async fn latest(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationState>, StorageError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(&conversation_id)
            .and_then(|history| history.last())
            .cloned())
    }

    async fn history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationState>, StorageError> {
        let snapshots = self.snapshots.read().await;
        Ok(snapshots
            .get(&conversation_id)
            .map(|history| history.iter().rev().take(limit).cloned().collect())
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::Timestamp;

    #[tokio::test]
    async fn latest_returns_most_recent_snapshot() {
        let repo = InMemoryStateRepository::new();
        let first = ConversationState::new(ConversationId::new());
        let second = first.next_snapshot();

        repo.append(&first).await.unwrap();
        repo.append(&second).await.unwrap();

        let latest = repo.latest(first.conversation_id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn latest_orders_by_created_at_not_append_order() {
        let repo = InMemoryStateRepository::new();
        let now = Timestamp::now();
        let first = ConversationState::new_at(ConversationId::new(), now);
        let second = first.next_snapshot_at(now.plus_secs(10));

        repo.append(&second).await.unwrap();
        repo.append(&first).await.unwrap();

        let latest = repo.latest(first.conversation_id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.id);
    }

    #[tokio::test]
    async fn latest_is_none_for_unknown_conversation() {
        let repo = InMemoryStateRepository::new();
        assert!(repo.latest(ConversationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn append_rejects_duplicate_snapshot() {
        let repo = InMemoryStateRepository::new();
        let state = ConversationState::new(ConversationId::new());

        repo.append(&state).await.unwrap();
        let result = repo.append(&state).await;

        assert_eq!(result, Err(StorageError::DuplicateSnapshot(state.id)));
        assert_eq!(repo.snapshot_count().await, 1);
    }

    #[tokio::test]
    async fn history_is_most_recent_first_and_limited() {
        let repo = InMemoryStateRepository::new();
        let a = ConversationState::new(ConversationId::new());
        let b = a.next_snapshot();
        let c = b.next_snapshot();
        for s in [&a, &b, &c] {
            repo.append(s).await.unwrap();
        }

        let history = repo.history(a.conversation_id, 2).await.unwrap();

        assert_eq!(history.iter().map(|s| s.id).collect::<Vec<_>>(), vec![c.id, b.id]);
    }
}
