//! Steering hints produced by strategies and by the merge step.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::domain::foundation::Priority;

/// Hint type assigned when more than one hint set contributed to a merge.
pub const MERGED_HINT_TYPE: &str = "merged";

/// Suggestions plus prompt context a strategy proposes for the next reply.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SteeringHints {
    #[serde(rename = "type")]
    pub hint_type: String,
    pub suggestions: Vec<String>,
    /// Open mapping consumed by prompt construction.
    #[serde(default)]
    pub context: HashMap<String, Value>,
    pub priority: Priority,
}

impl SteeringHints {
    /// Creates hints with an empty context. Priority is clamped to [0, 1].
    pub fn new(hint_type: impl Into<String>, suggestions: Vec<String>, priority: f64) -> Self {
        Self {
            hint_type: hint_type.into(),
            suggestions,
            context: HashMap::new(),
            priority: Priority::new(priority),
        }
    }

    /// Adds one context entry.
    pub fn with_context(mut self, key: impl Into<String>, value: Value) -> Self {
        self.context.insert(key.into(), value);
        self
    }

    /// True when the hints carry neither suggestions nor context.
    pub fn is_empty(&self) -> bool {
        self.suggestions.is_empty() && self.context.is_empty()
    }

    /// True when produced by merging several hint sets.
    pub fn is_merged(&self) -> bool {
        self.hint_type == MERGED_HINT_TYPE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serializes_hint_type_as_type() {
        let hints = SteeringHints::new("budget", vec!["ask about budget".into()], 0.9);
        let json = serde_json::to_value(&hints).unwrap();

        assert_eq!(json["type"], "budget");
        assert_eq!(json["priority"], 0.9);
    }

    #[test]
    fn with_context_adds_entries() {
        let hints = SteeringHints::new("budget", vec![], 0.5).with_context("tone", json!("gentle"));

        assert_eq!(hints.context.get("tone"), Some(&json!("gentle")));
        assert!(!hints.is_empty());
    }

    #[test]
    fn empty_hints_report_empty() {
        assert!(SteeringHints::new("noop", vec![], 0.1).is_empty());
    }
}
