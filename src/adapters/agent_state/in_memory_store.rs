//! In-Memory Agent State Store
//!
//! One lock guards both the record map and the index of current records per
//! (conversation, domain, state type), so a record's visibility and its
//! physical deletion always change together. "Now" comes from an injected
//! clock.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::agent_state::{is_active, is_expired, merge_data, AgentState};
use crate::domain::foundation::{AgentStateId, Clock, ConversationId, SystemClock, ValidationError};
use crate::ports::{AgentStateError, AgentStateStore};

type TupleKey = (ConversationId, String, String);

#[derive(Debug)]
struct StoredRecord {
    record: AgentState,
    /// Insertion order; breaks ties between equal `created_at`.
    seq: u64,
}

#[derive(Debug, Default)]
struct Inner {
    records: HashMap<AgentStateId, StoredRecord>,
    /// Current record per tuple. Older records of a tuple are superseded.
    current: HashMap<TupleKey, AgentStateId>,
    next_seq: u64,
}

impl Inner {
    fn insert(&mut self, record: AgentState) -> AgentStateId {
        let id = record.id;
        let key = (
            record.conversation_id,
            record.domain_id.clone(),
            record.state_type.clone(),
        );
        let seq = self.next_seq;
        self.next_seq += 1;
        self.records.insert(id, StoredRecord { record, seq });
        self.current.insert(key, id);
        id
    }

    fn current_record(&self, key: &TupleKey) -> Option<&AgentState> {
        self.current
            .get(key)
            .and_then(|id| self.records.get(id))
            .map(|stored| &stored.record)
    }

    /// Drop index entries whose record is gone.
    fn prune_index(&mut self) {
        let records = &self.records;
        self.current.retain(|_, id| records.contains_key(id));
    }
}

/// In-memory agent state store
#[derive(Debug)]
pub struct InMemoryAgentStateStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemoryAgentStateStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryAgentStateStore {
    /// Store using the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    /// Store using the given clock.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), AgentStateError> {
    if value.trim().is_empty() {
        return Err(ValidationError::empty_field(field).into());
    }
    Ok(())
}

#[async_trait]
impl AgentStateStore for InMemoryAgentStateStore {
    async fn save_state(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: &str,
        data: Value,
        ttl_secs: u64,
    ) -> Result<AgentStateId, AgentStateError> {
        require("domain_id", domain_id)?;
        require("state_type", state_type)?;

        let now = self.clock.now();
        let record = AgentState::new(conversation_id, domain_id, state_type, data, ttl_secs, now);
        let id = self.inner.write().await.insert(record);

        tracing::debug!(
            conversation_id = %conversation_id,
            domain_id = %domain_id,
            state_type = %state_type,
            ttl_secs,
            "Agent state saved"
        );
        Ok(id)
    }

    async fn get_state_with_metadata(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: Option<&str>,
    ) -> Result<Option<AgentState>, AgentStateError> {
        let now = self.clock.now();
        let inner = self.inner.read().await;

        let found = match state_type {
            Some(state_type) => inner
                .current_record(&(conversation_id, domain_id.to_string(), state_type.to_string()))
                .filter(|r| is_active(now, r)),
            None => inner
                .current
                .iter()
                .filter(|((conv, domain, _), _)| *conv == conversation_id && domain == domain_id)
                .filter_map(|(_, id)| inner.records.get(id))
                .filter(|stored| is_active(now, &stored.record))
                .max_by(|a, b| {
                    a.record
                        .created_at
                        .cmp(&b.record.created_at)
                        .then(a.seq.cmp(&b.seq))
                })
                .map(|stored| &stored.record),
        };

        Ok(found.cloned())
    }

    async fn resolve_state(&self, id: AgentStateId) -> Result<bool, AgentStateError> {
        let mut inner = self.inner.write().await;
        match inner.records.get_mut(&id) {
            Some(stored) => {
                stored.record.resolved = true;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_state(
        &self,
        conversation_id: ConversationId,
        domain_id: &str,
        state_type: &str,
        updates: Value,
        ttl_secs: Option<u64>,
    ) -> Result<bool, AgentStateError> {
        let now = self.clock.now();
        let mut inner = self.inner.write().await;

        let key = (conversation_id, domain_id.to_string(), state_type.to_string());
        let Some(current) = inner.current_record(&key).filter(|r| is_active(now, r)) else {
            return Ok(false);
        };

        let mut data = current.data.clone();
        merge_data(&mut data, updates);
        let ttl = ttl_secs.unwrap_or_else(|| current.ttl_secs());

        inner.insert(AgentState::new(conversation_id, domain_id, state_type, data, ttl, now));
        Ok(true)
    }

    async fn clear_conversation_states(
        &self,
        conversation_id: ConversationId,
    ) -> Result<usize, AgentStateError> {
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner
            .records
            .retain(|_, stored| stored.record.conversation_id != conversation_id);
        inner.prune_index();
        Ok(before - inner.records.len())
    }

    async fn purge_expired(&self) -> Result<usize, AgentStateError> {
        let now = self.clock.now();
        let mut inner = self.inner.write().await;
        let before = inner.records.len();
        inner.records.retain(|_, stored| !is_expired(now, &stored.record));
        inner.prune_index();
        Ok(before - inner.records.len())
    }

    async fn record_count(&self) -> Result<usize, AgentStateError> {
        Ok(self.inner.read().await.records.len())
    }
}
