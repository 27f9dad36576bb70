//! Conversation State Snapshot
//!
//! The value object threaded through the stage pipeline. A snapshot is
//! immutable once persisted: every turn derives a new snapshot with a new id
//! and `created_at`, and the current state of a conversation is the snapshot
//! with the latest `created_at`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::foundation::{ConversationId, GoalId, SnapshotId, Timestamp};
use crate::domain::steering::SteeringHints;

use super::ConversationMode;

/// Working memory of one conversation at one point in time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConversationState {
    pub id: SnapshotId,
    pub conversation_id: ConversationId,
    pub mode: ConversationMode,
    pub context_elements: Vec<ContextElement>,
    pub goals: Vec<Goal>,
    /// Domain id -> extraction results in the order they were produced.
    pub extractions: HashMap<String, Vec<ExtractionResult>>,
    /// Set by the steering stage; `None` means no strategy contributed this turn.
    pub steering_hints: Option<SteeringHints>,
    pub metadata: HashMap<String, Value>,
    #[serde(default)]
    pub message_history: Vec<TurnMessage>,
    pub last_activity_at: Timestamp,
    pub created_at: Timestamp,
}

impl ConversationState {
    /// Create the first snapshot of a conversation
    pub fn new(conversation_id: ConversationId) -> Self {
        Self::new_at(conversation_id, Timestamp::now())
    }

    /// Create the first snapshot of a conversation at a given instant
    pub fn new_at(conversation_id: ConversationId, now: Timestamp) -> Self {
        Self {
            id: SnapshotId::new(),
            conversation_id,
            mode: ConversationMode::default(),
            context_elements: Vec::new(),
            goals: Vec::new(),
            extractions: HashMap::new(),
            steering_hints: None,
            metadata: HashMap::new(),
            message_history: Vec::new(),
            last_activity_at: now,
            created_at: now,
        }
    }

    /// Derive the successor snapshot for a new turn.
    ///
    /// Carries all accumulated memory forward under a fresh id and
    /// `created_at`. Steering hints are per-turn output and are not carried.
    pub fn next_snapshot(&self) -> Self {
        self.next_snapshot_at(Timestamp::now())
    }

    /// Derive the successor snapshot at a given instant
    pub fn next_snapshot_at(&self, now: Timestamp) -> Self {
        Self {
            steering_hints: None,
            ..self.revision_at(now)
        }
    }

    /// A later snapshot of the same turn: everything, steering hints
    /// included, carried under a fresh id and `created_at`.
    pub fn revision_at(&self, now: Timestamp) -> Self {
        Self {
            id: SnapshotId::new(),
            created_at: self.created_after(now),
            ..self.clone()
        }
    }

    /// `now`, or the earliest instant after this snapshot when the clock has
    /// not moved past it. Snapshots of one conversation are strictly ordered.
    pub fn created_after(&self, now: Timestamp) -> Timestamp {
        if now.is_after(&self.created_at) {
            now
        } else {
            self.created_at.plus(chrono::Duration::microseconds(1))
        }
    }

    /// Set the conversation mode
    pub fn with_mode(mut self, mode: ConversationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Append an extraction result for a domain
    pub fn append_extraction(&mut self, result: ExtractionResult) {
        self.extractions
            .entry(result.domain_id.clone())
            .or_default()
            .push(result);
    }

    /// All extraction results recorded for a domain, oldest first
    pub fn extractions_for(&self, domain_id: &str) -> &[ExtractionResult] {
        self.extractions
            .get(domain_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent extraction result for a domain
    pub fn latest_extraction(&self, domain_id: &str) -> Option<&ExtractionResult> {
        self.extractions_for(domain_id).last()
    }

    /// Add a timestamped fact to the working context
    pub fn add_context_element(&mut self, key: impl Into<String>, value: Value, now: Timestamp) {
        self.context_elements.push(ContextElement {
            key: key.into(),
            value,
            created_at: now,
            last_accessed_at: now,
        });
    }

    /// Mark every context element with the given key as accessed.
    ///
    /// Returns the number of elements touched.
    pub fn touch_context_element(&mut self, key: &str, now: Timestamp) -> usize {
        let mut touched = 0;
        for element in self.context_elements.iter_mut().filter(|e| e.key == key) {
            element.last_accessed_at = now;
            touched += 1;
        }
        touched
    }

    /// Latest value recorded under a context key
    pub fn context_value(&self, key: &str) -> Option<&Value> {
        self.context_elements
            .iter()
            .rev()
            .find(|e| e.key == key)
            .map(|e| &e.value)
    }

    /// Add a new active goal, returning its id
    pub fn add_goal(&mut self, description: impl Into<String>, domain_id: Option<String>, now: Timestamp) -> GoalId {
        let goal = Goal {
            id: GoalId::new(),
            description: description.into(),
            domain_id,
            status: GoalStatus::Active,
            created_at: now,
            updated_at: now,
        };
        let id = goal.id;
        self.goals.push(goal);
        id
    }

    /// Mark a goal completed. Returns false if the goal is unknown.
    pub fn complete_goal(&mut self, goal_id: GoalId, now: Timestamp) -> bool {
        match self.goals.iter_mut().find(|g| g.id == goal_id) {
            Some(goal) => {
                goal.status = GoalStatus::Completed;
                goal.updated_at = now;
                true
            }
            None => false,
        }
    }

    /// Goals still being pursued
    pub fn active_goals(&self) -> impl Iterator<Item = &Goal> {
        self.goals.iter().filter(|g| g.status == GoalStatus::Active)
    }

    /// Attach merged steering hints
    pub fn set_steering_hints(&mut self, hints: SteeringHints) {
        self.steering_hints = Some(hints);
    }

    /// Record a message and keep at most `window` entries of history
    pub fn record_message(&mut self, role: MessageRole, content: impl Into<String>, now: Timestamp, window: usize) {
        self.message_history.push(TurnMessage {
            role,
            content: content.into(),
            mode: self.mode,
            timestamp: now,
        });
        if self.message_history.len() > window {
            let excess = self.message_history.len() - window;
            self.message_history.drain(..excess);
        }
        self.last_activity_at = now;
    }

    /// Update the last activity marker
    pub fn record_activity(&mut self, now: Timestamp) {
        self.last_activity_at = now;
    }

    /// Set a metadata entry
    pub fn set_metadata(&mut self, key: impl Into<String>, value: Value) {
        self.metadata.insert(key.into(), value);
    }
}

/// A timestamped fact in the conversation's working context
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContextElement {
    pub key: String,
    pub value: Value,
    pub created_at: Timestamp,
    pub last_accessed_at: Timestamp,
}

/// A goal the user is pursuing
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Goal {
    pub id: GoalId,
    pub description: String,
    pub domain_id: Option<String>,
    pub status: GoalStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Status of a goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalStatus {
    Active,
    Completed,
    Abandoned,
}

/// Structured facts a domain plugin derived from one turn
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExtractionResult {
    pub domain_id: String,
    pub data: Value,
    pub confidence: Option<f64>,
    pub extracted_at: Timestamp,
}

impl ExtractionResult {
    /// Create an extraction result stamped with the current time
    pub fn new(domain_id: impl Into<String>, data: Value) -> Self {
        Self {
            domain_id: domain_id.into(),
            data,
            confidence: None,
            extracted_at: Timestamp::now(),
        }
    }

    /// Attach a confidence score
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// One message in the conversation history
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TurnMessage {
    pub role: MessageRole,
    pub content: String,
    pub mode: ConversationMode,
    pub timestamp: Timestamp,
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn state() -> ConversationState {
        ConversationState::new(ConversationId::new())
    }

    #[test]
    fn new_state_starts_empty_in_default_mode() {
        let state = state();

        assert_eq!(state.mode, ConversationMode::Consult);
        assert!(state.steering_hints.is_none());
        assert!(state.extractions.is_empty());
        assert_eq!(state.created_at, state.last_activity_at);
    }

    #[test]
    fn next_snapshot_has_new_identity_and_later_creation() {
        let mut first = state();
        first.add_context_element("budget", json!(1200), first.created_at);

        let second = first.next_snapshot_at(first.created_at);

        assert_ne!(second.id, first.id);
        assert_eq!(second.conversation_id, first.conversation_id);
        assert!(second.created_at.is_after(&first.created_at));
        assert_eq!(second.context_elements, first.context_elements);
    }

    #[test]
    fn next_snapshot_drops_previous_turn_hints() {
        let mut first = state();
        first.set_steering_hints(SteeringHints::new("finance", vec!["ask".into()], 0.5));

        let second = first.next_snapshot();

        assert!(first.steering_hints.is_some());
        assert!(second.steering_hints.is_none());
    }

    #[test]
    fn revision_keeps_hints_under_new_identity() {
        let mut first = state();
        first.set_steering_hints(SteeringHints::new("finance", vec!["ask".into()], 0.5));

        let revised = first.revision_at(first.created_at);

        assert_ne!(revised.id, first.id);
        assert!(revised.created_at.is_after(&first.created_at));
        assert_eq!(revised.steering_hints, first.steering_hints);
    }

    #[test]
    fn extractions_are_appended_per_domain() {
        let mut state = state();
        state.append_extraction(ExtractionResult::new("finance", json!({"amount": 10})));
        state.append_extraction(ExtractionResult::new("finance", json!({"amount": 20})));
        state.append_extraction(ExtractionResult::new("health", json!({"steps": 900})));

        assert_eq!(state.extractions_for("finance").len(), 2);
        assert_eq!(state.latest_extraction("finance").unwrap().data, json!({"amount": 20}));
        assert_eq!(state.extractions_for("health").len(), 1);
        assert!(state.extractions_for("travel").is_empty());
    }

    #[test]
    fn touch_context_element_updates_access_time() {
        let mut state = state();
        let start = state.created_at;
        state.add_context_element("income", json!(5000), start);

        let later = start.plus_secs(60);
        assert_eq!(state.touch_context_element("income", later), 1);
        assert_eq!(state.touch_context_element("missing", later), 0);

        let element = &state.context_elements[0];
        assert_eq!(element.created_at, start);
        assert_eq!(element.last_accessed_at, later);
    }

    #[test]
    fn context_value_returns_latest_for_key() {
        let mut state = state();
        let now = state.created_at;
        state.add_context_element("city", json!("Lyon"), now);
        state.add_context_element("city", json!("Paris"), now);

        assert_eq!(state.context_value("city"), Some(&json!("Paris")));
    }

    #[test]
    fn goals_can_be_completed() {
        let mut state = state();
        let now = state.created_at;
        let save = state.add_goal("Save for a car", Some("finance".into()), now);
        state.add_goal("Run a 10k", Some("health".into()), now);

        assert!(state.complete_goal(save, now));
        assert!(!state.complete_goal(GoalId::new(), now));
        assert_eq!(state.active_goals().count(), 1);
    }

    #[test]
    fn record_message_trims_to_window() {
        let mut state = state();
        let now = state.created_at;
        for i in 0..5 {
            state.record_message(MessageRole::User, format!("message {}", i), now, 3);
        }

        assert_eq!(state.message_history.len(), 3);
        assert_eq!(state.message_history[0].content, "message 2");
        assert_eq!(state.message_history[2].content, "message 4");
    }

    #[test]
    fn state_serializes_roundtrip() {
        let mut state = state();
        state.set_metadata("channel", json!("cli"));
        state.append_extraction(ExtractionResult::new("finance", json!({"a": 1})).with_confidence(0.8));

        let json = serde_json::to_string(&state).unwrap();
        let back: ConversationState = serde_json::from_str(&json).unwrap();

        assert_eq!(back, state);
    }
}
