//! File-based State Repository Adapter
//!
//! Stores each conversation snapshot as a YAML file on disk, one directory
//! per conversation:
//!
//! ```text
//! <base>/<conversation_id>/<snapshot_id>.yaml
//! ```

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::{ConversationId, SnapshotId};
use crate::ports::{ConversationStateRepository, StorageError};

/// File-based snapshot storage
#[derive(Debug, Clone)]
pub struct FileStateRepository {
    base_path: PathBuf,
}

impl FileStateRepository {
    /// Create a new file repository with a base directory
    ///
    /// # Example
    /// ```ignore
    /// let repo = FileStateRepository::new("./data/conversations");
    /// ```
    pub fn new<P: AsRef<Path>>(base_path: P) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    fn conversation_dir(&self, conversation_id: ConversationId) -> PathBuf {
        self.base_path.join(conversation_id.to_string())
    }

    fn snapshot_path(&self, conversation_id: ConversationId, snapshot_id: SnapshotId) -> PathBuf {
        self.conversation_dir(conversation_id)
            .join(format!("{snapshot_id}.yaml"))
    }

    async fn ensure_dir(&self, path: &Path) -> Result<(), StorageError> {
        fs::create_dir_all(path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))
    }

    /// All snapshots of a conversation, oldest first
    async fn load_all(&self, conversation_id: ConversationId) -> Result<Vec<ConversationState>, StorageError> {
        let dir = self.conversation_dir(conversation_id);
        if !path_exists(&dir).await? {
            return Ok(Vec::new());
        }

        let mut entries = fs::read_dir(&dir)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        let mut snapshots = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?
        {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("yaml") {
                continue;
            }
            let yaml = fs::read_to_string(&path)
                .await
                .map_err(|e| StorageError::IoError(e.to_string()))?;
            let state: ConversationState = serde_yaml::from_str(&yaml)
                .map_err(|e| StorageError::DeserializationFailed(format!("{}: {e}", path.display())))?;
            snapshots.push(state);
        }

        snapshots.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(snapshots)
    }
}

async fn path_exists(path: &Path) -> Result<bool, StorageError> {
    fs::try_exists(path)
        .await
        .map_err(|e| StorageError::IoError(e.to_string()))
}

#[async_trait]
impl ConversationStateRepository for FileStateRepository {
    async fn append(&self, state: &ConversationState) -> Result<(), StorageError> {
        let dir = self.conversation_dir(state.conversation_id);
        self.ensure_dir(&dir).await?;

        let file_path = self.snapshot_path(state.conversation_id, state.id);
        if path_exists(&file_path).await? {
            return Err(StorageError::DuplicateSnapshot(state.id));
        }

        let yaml = serde_yaml::to_string(state)
            .map_err(|e| StorageError::SerializationFailed(e.to_string()))?;

        // Readers only pick up *.yaml, so a partial write is never visible.
        let tmp_path = file_path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;
        fs::rename(&tmp_path, &file_path)
            .await
            .map_err(|e| StorageError::IoError(e.to_string()))?;

        tracing::debug!(
            conversation_id = %state.conversation_id,
            snapshot_id = %state.id,
            path = %file_path.display(),
            "Snapshot written"
        );
        Ok(())
    }

    async fn latest(
        &self,
        conversation_id: ConversationId,
    ) -> Result<Option<ConversationState>, StorageError> {
        Ok(self.load_all(conversation_id).await?.pop())
    }

    async fn history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationState>, StorageError> {
        let snapshots = self.load_all(conversation_id).await?;
        Ok(snapshots.into_iter().rev().take(limit).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::{ConversationMode, ExtractionResult, MessageRole};
    use crate::domain::foundation::Timestamp;
    use crate::domain::steering::SteeringHints;
    use serde_json::json;
    use tempfile::TempDir;

    fn rich_state() -> ConversationState {
        let now = Timestamp::now();
        let mut state = ConversationState::new_at(ConversationId::new(), now)
            .with_mode(ConversationMode::Meta);
        state.add_goal("Pay off the car", Some("finance".into()), now);
        state.add_context_element("city", json!("Lisbon"), now);
        state.append_extraction(ExtractionResult::new("finance", json!({"debt": 4000})).with_confidence(0.8));
        state.set_steering_hints(SteeringHints::new("merged", vec!["ask about rate".into()], 0.7));
        state.set_metadata("channel", json!("cli"));
        state.record_message(MessageRole::User, "hello", now, 10);
        state
    }

    #[tokio::test]
    async fn append_and_load_round_trips_state() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(temp_dir.path());
        let state = rich_state();

        repo.append(&state).await.unwrap();
        let loaded = repo.latest(state.conversation_id).await.unwrap().unwrap();

        assert_eq!(loaded, state);
    }

    #[tokio::test]
    async fn latest_is_none_for_unknown_conversation() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(temp_dir.path());

        assert!(repo.latest(ConversationId::new()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn history_orders_by_created_at() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(temp_dir.path());
        let now = Timestamp::now();
        let a = ConversationState::new_at(ConversationId::new(), now);
        let b = a.next_snapshot_at(now.plus_secs(1));
        let c = b.next_snapshot_at(now.plus_secs(2));
        for s in [&c, &a, &b] {
            repo.append(s).await.unwrap();
        }

        let history = repo.history(a.conversation_id, 10).await.unwrap();

        assert_eq!(history.iter().map(|s| s.id).collect::<Vec<_>>(), vec![c.id, b.id, a.id]);
    }

    #[tokio::test]
    async fn append_rejects_duplicate_snapshot() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(temp_dir.path());
        let state = ConversationState::new(ConversationId::new());

        repo.append(&state).await.unwrap();

        assert!(matches!(
            repo.append(&state).await,
            Err(StorageError::DuplicateSnapshot(_))
        ));
    }

    #[tokio::test]
    async fn conversation_path_that_is_not_a_directory_is_an_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(temp_dir.path());
        let conversation_id = ConversationId::new();
        std::fs::write(temp_dir.path().join(conversation_id.to_string()), "").unwrap();

        assert!(matches!(
            repo.latest(conversation_id).await,
            Err(StorageError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn corrupt_snapshot_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let repo = FileStateRepository::new(temp_dir.path());
        let conversation_id = ConversationId::new();
        let dir = temp_dir.path().join(conversation_id.to_string());
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("broken.yaml"), "not: [valid").unwrap();

        assert!(matches!(
            repo.latest(conversation_id).await,
            Err(StorageError::DeserializationFailed(_))
        ));
    }
}
