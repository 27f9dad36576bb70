//! Steering hint merge.
//!
//! Collapses the hint sets produced by concurrently evaluated strategies into
//! one bounded, deduplicated set:
//!
//! 1. Sort hint sets by priority, highest first (stable).
//! 2. Keep the top `max_hint_sets`.
//! 3. Concatenate their suggestions in that order, dropping any suggestion
//!    equal (trimmed, case-insensitive) to an earlier one, and keep at most
//!    `max_suggestions`.
//! 4. Overlay their context maps according to [`ContextMergePolicy`].
//! 5. Type is [`MERGED_HINT_TYPE`] when more than one set contributed;
//!    priority is the highest contributing priority.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::{SteeringHints, MERGED_HINT_TYPE};

/// Default number of hint sets that contribute to a merge.
pub const DEFAULT_MAX_HINT_SETS: usize = 3;

/// Default cap on merged suggestions.
pub const DEFAULT_MAX_SUGGESTIONS: usize = 3;

/// How colliding context keys are resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ContextMergePolicy {
    /// Contexts are overlaid in priority-descending order, so the
    /// lowest-priority contributor's value for a key survives.
    #[default]
    LowerPriorityOverwrites,
    /// The highest-priority contributor's value for a key survives.
    HighestPriorityWins,
}

/// Tunables for [`merge_hints`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeOptions {
    pub max_hint_sets: usize,
    pub max_suggestions: usize,
    pub context_policy: ContextMergePolicy,
}

impl Default for MergeOptions {
    fn default() -> Self {
        Self {
            max_hint_sets: DEFAULT_MAX_HINT_SETS,
            max_suggestions: DEFAULT_MAX_SUGGESTIONS,
            context_policy: ContextMergePolicy::default(),
        }
    }
}

/// Merge hint sets into one. Returns `None` when nothing contributes.
pub fn merge_hints(mut hints: Vec<SteeringHints>, options: &MergeOptions) -> Option<SteeringHints> {
    // sort_by is stable: equal priorities keep arrival order.
    hints.sort_by(|a, b| b.priority.cmp(&a.priority));
    hints.truncate(options.max_hint_sets);

    let (top, _) = hints.split_first()?;
    let hint_type = if hints.len() > 1 {
        MERGED_HINT_TYPE.to_string()
    } else {
        top.hint_type.clone()
    };
    let priority = top.priority;

    let suggestions = dedup_suggestions(
        hints.iter().flat_map(|h| h.suggestions.iter()),
        options.max_suggestions,
    );
    let context = merge_context(&hints, options.context_policy);

    Some(SteeringHints {
        hint_type,
        suggestions,
        context,
        priority,
    })
}

/// Keep the first occurrence of each suggestion, comparing trimmed and
/// case-folded text. Blank suggestions are dropped.
pub fn dedup_suggestions<'a, I>(suggestions: I, limit: usize) -> Vec<String>
where
    I: IntoIterator<Item = &'a String>,
{
    let mut seen = HashSet::new();
    let mut merged = Vec::new();

    for suggestion in suggestions {
        if merged.len() >= limit {
            break;
        }
        let key = normalize(suggestion);
        if key.is_empty() {
            continue;
        }
        if seen.insert(key) {
            merged.push(suggestion.clone());
        }
    }

    merged
}

fn normalize(suggestion: &str) -> String {
    suggestion.trim().to_lowercase()
}

/// `hints` must already be in priority-descending order.
fn merge_context(hints: &[SteeringHints], policy: ContextMergePolicy) -> HashMap<String, Value> {
    let mut merged = HashMap::new();

    for hint in hints {
        for (key, value) in &hint.context {
            match policy {
                ContextMergePolicy::LowerPriorityOverwrites => {
                    merged.insert(key.clone(), value.clone());
                }
                ContextMergePolicy::HighestPriorityWins => {
                    merged.entry(key.clone()).or_insert_with(|| value.clone());
                }
            }
        }
    }

    merged
}
