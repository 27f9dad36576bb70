//! Agent state record - short-lived working memory scoped to
//! (conversation, domain, state type).

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::foundation::{AgentStateId, ConversationId, Timestamp};

/// One stored piece of agent working memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AgentState {
    pub id: AgentStateId,
    pub conversation_id: ConversationId,
    pub domain_id: String,
    pub state_type: String,
    pub data: Value,
    pub created_at: Timestamp,
    pub expires_at: Timestamp,
    pub resolved: bool,
}

impl AgentState {
    /// Create a record that expires `ttl_secs` after `now`.
    pub fn new(
        conversation_id: ConversationId,
        domain_id: impl Into<String>,
        state_type: impl Into<String>,
        data: Value,
        ttl_secs: u64,
        now: Timestamp,
    ) -> Self {
        Self {
            id: AgentStateId::new(),
            conversation_id,
            domain_id: domain_id.into(),
            state_type: state_type.into(),
            data,
            created_at: now,
            expires_at: now.plus_secs(ttl_secs),
            resolved: false,
        }
    }

    /// Lifetime the record was granted, in whole seconds.
    pub fn ttl_secs(&self) -> u64 {
        let secs = self.expires_at.duration_since(&self.created_at).num_seconds();
        u64::try_from(secs).unwrap_or(0)
    }
}

/// A record is expired once `now` reaches `expires_at`.
pub fn is_expired(now: Timestamp, record: &AgentState) -> bool {
    !now.is_before(&record.expires_at)
}

/// Visible to readers: neither resolved nor expired.
pub fn is_active(now: Timestamp, record: &AgentState) -> bool {
    !record.resolved && !is_expired(now, record)
}

/// Shallow merge of `updates` into `data`.
///
/// Objects merge key by key with `updates` winning; any other shape of
/// `updates` replaces `data` outright.
pub fn merge_data(data: &mut Value, updates: Value) {
    match (data, updates) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                existing.insert(key, value);
            }
        }
        (slot, incoming) => *slot = incoming,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(ttl: u64, now: Timestamp) -> AgentState {
        AgentState::new(ConversationId::new(), "finance", "pending_question", json!({"q": 1}), ttl, now)
    }

    #[test]
    fn zero_ttl_is_expired_immediately() {
        let now = Timestamp::now();
        let r = record(0, now);
        assert!(is_expired(now, &r));
        assert!(!is_active(now, &r));
    }

    #[test]
    fn record_is_active_until_expiry() {
        let now = Timestamp::now();
        let r = record(300, now);

        assert!(is_active(now.plus_secs(299), &r));
        assert!(is_expired(now.plus_secs(300), &r));
    }

    #[test]
    fn resolved_record_is_not_active() {
        let now = Timestamp::now();
        let mut r = record(300, now);
        r.resolved = true;

        assert!(!is_expired(now, &r));
        assert!(!is_active(now, &r));
    }

    #[test]
    fn ttl_secs_reports_granted_lifetime() {
        let r = record(120, Timestamp::now());
        assert_eq!(r.ttl_secs(), 120);
    }

    #[test]
    fn merge_data_overlays_object_keys() {
        let mut data = json!({"a": 1, "b": {"x": 1}});
        merge_data(&mut data, json!({"b": {"y": 2}, "c": 3}));
        assert_eq!(data, json!({"a": 1, "b": {"y": 2}, "c": 3}));
    }

    #[test]
    fn merge_data_replaces_non_objects() {
        let mut data = json!([1, 2]);
        merge_data(&mut data, json!({"a": 1}));
        assert_eq!(data, json!({"a": 1}));
    }
}
