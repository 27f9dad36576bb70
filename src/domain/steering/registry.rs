//! Steering Registry - catalog of steering strategies.
//!
//! Keyed by strategy id. Unlike the domain registry, registering an id that
//! already exists replaces the previous strategy and logs a warning.
//!
//! # Example
//!
//! ```ignore
//! let mut registry = SteeringRegistry::new();
//! registry.register(Arc::new(BudgetStrategy::default()));
//!
//! for strategy in registry.get_all_strategies() {
//!     println!("{} ({})", strategy.strategy_id(), strategy.priority());
//! }
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::SteeringStrategy;

struct Entry {
    strategy: Arc<dyn SteeringStrategy>,
    /// Registration sequence, used as the tie-breaker for equal priorities.
    seq: u64,
}

/// Catalog of steering strategies, owned by the application context.
#[derive(Default)]
pub struct SteeringRegistry {
    strategies: HashMap<String, Entry>,
    next_seq: u64,
}

impl fmt::Debug for SteeringRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SteeringRegistry")
            .field("strategies", &self.strategy_ids())
            .finish()
    }
}

impl SteeringRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a strategy, replacing any strategy with the same id.
    pub fn register(&mut self, strategy: Arc<dyn SteeringStrategy>) {
        let id = strategy.strategy_id().to_string();
        let seq = self.next_seq;
        self.next_seq += 1;

        if self.strategies.contains_key(&id) {
            tracing::warn!(strategy_id = %id, "Replacing already registered steering strategy");
        } else {
            tracing::info!(
                strategy_id = %id,
                priority = %strategy.priority(),
                "Registered steering strategy"
            );
        }

        self.strategies.insert(id, Entry { strategy, seq });
    }

    /// Removes a strategy. Absent ids are ignored.
    pub fn unregister(&mut self, strategy_id: &str) {
        if self.strategies.remove(strategy_id).is_some() {
            tracing::info!(strategy_id = %strategy_id, "Unregistered steering strategy");
        }
    }

    /// Gets a strategy by id.
    pub fn get_strategy(&self, strategy_id: &str) -> Option<Arc<dyn SteeringStrategy>> {
        self.strategies
            .get(strategy_id)
            .map(|entry| Arc::clone(&entry.strategy))
    }

    /// Checks if a strategy is registered.
    pub fn has_strategy(&self, strategy_id: &str) -> bool {
        self.strategies.contains_key(strategy_id)
    }

    /// All strategies, highest priority first, ties in registration order.
    pub fn get_all_strategies(&self) -> Vec<Arc<dyn SteeringStrategy>> {
        let mut entries: Vec<&Entry> = self.strategies.values().collect();
        entries.sort_by(|a, b| {
            b.strategy
                .priority()
                .cmp(&a.strategy.priority())
                .then(a.seq.cmp(&b.seq))
        });
        entries
            .into_iter()
            .map(|entry| Arc::clone(&entry.strategy))
            .collect()
    }

    /// Strategies explicitly associated with a domain, in priority order.
    pub fn get_strategies_for_domain(&self, domain_id: &str) -> Vec<Arc<dyn SteeringStrategy>> {
        self.get_all_strategies()
            .into_iter()
            .filter(|s| s.domain_ids().iter().any(|d| d == domain_id))
            .collect()
    }

    /// Returns all registered strategy ids (unordered).
    pub fn strategy_ids(&self) -> Vec<&str> {
        self.strategies.keys().map(String::as_str).collect()
    }

    /// Number of registered strategies.
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }

    /// Removes every strategy.
    pub fn clear(&mut self) {
        self.strategies.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::conversation::ConversationState;
    use crate::domain::foundation::Priority;
    use crate::domain::steering::{SteeringError, SteeringHints};
    use async_trait::async_trait;

    struct FixedStrategy {
        id: String,
        domains: Vec<String>,
        priority: Priority,
        label: &'static str,
    }

    impl FixedStrategy {
        fn new(id: &str, priority: f64, domains: &[&str]) -> Self {
            Self::labelled(id, priority, domains, "v1")
        }

        fn labelled(id: &str, priority: f64, domains: &[&str], label: &'static str) -> Self {
            Self {
                id: id.to_string(),
                domains: domains.iter().map(|d| d.to_string()).collect(),
                priority: Priority::new(priority),
                label,
            }
        }
    }

    #[async_trait]
    impl SteeringStrategy for FixedStrategy {
        fn strategy_id(&self) -> &str {
            &self.id
        }

        fn domain_ids(&self) -> &[String] {
            &self.domains
        }

        fn priority(&self) -> Priority {
            self.priority
        }

        fn should_apply(&self, _state: &ConversationState) -> bool {
            true
        }

        async fn generate_hints(&self, _state: &ConversationState) -> Result<SteeringHints, SteeringError> {
            Ok(SteeringHints::new(self.label, vec![], self.priority.value()))
        }
    }

    fn ids(strategies: &[Arc<dyn SteeringStrategy>]) -> Vec<String> {
        strategies.iter().map(|s| s.strategy_id().to_string()).collect()
    }

    #[test]
    fn new_registry_is_empty() {
        let registry = SteeringRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get_all_strategies().is_empty());
    }

    #[test]
    fn strategies_are_sorted_by_priority_descending() {
        let mut registry = SteeringRegistry::new();
        registry.register(Arc::new(FixedStrategy::new("low", 0.2, &[])));
        registry.register(Arc::new(FixedStrategy::new("high", 0.9, &[])));
        registry.register(Arc::new(FixedStrategy::new("mid", 0.5, &[])));

        assert_eq!(ids(&registry.get_all_strategies()), vec!["high", "mid", "low"]);
    }

    #[test]
    fn equal_priorities_keep_registration_order() {
        let mut registry = SteeringRegistry::new();
        registry.register(Arc::new(FixedStrategy::new("first", 0.5, &[])));
        registry.register(Arc::new(FixedStrategy::new("second", 0.5, &[])));
        registry.register(Arc::new(FixedStrategy::new("third", 0.5, &[])));

        assert_eq!(ids(&registry.get_all_strategies()), vec!["first", "second", "third"]);
    }

    #[tokio::test]
    async fn duplicate_registration_replaces_existing() {
        let mut registry = SteeringRegistry::new();
        registry.register(Arc::new(FixedStrategy::labelled("budget", 0.5, &[], "v1")));
        registry.register(Arc::new(FixedStrategy::labelled("budget", 0.8, &[], "v2")));

        assert_eq!(registry.len(), 1);
        let strategy = registry.get_strategy("budget").unwrap();
        assert_eq!(strategy.priority(), Priority::new(0.8));

        let hints = strategy
            .generate_hints(&ConversationState::new(Default::default()))
            .await
            .unwrap();
        assert_eq!(hints.hint_type, "v2");
    }

    #[test]
    fn domain_lookup_is_exact_match() {
        let mut registry = SteeringRegistry::new();
        registry.register(Arc::new(FixedStrategy::new("health_checkin", 0.5, &["health"])));
        registry.register(Arc::new(FixedStrategy::new("mental_health_checkin", 0.6, &["mental_health"])));
        registry.register(Arc::new(FixedStrategy::new("wellbeing", 0.4, &["health", "mental_health"])));

        assert_eq!(
            ids(&registry.get_strategies_for_domain("health")),
            vec!["health_checkin", "wellbeing"]
        );
        assert_eq!(
            ids(&registry.get_strategies_for_domain("mental_health")),
            vec!["mental_health_checkin", "wellbeing"]
        );
        assert!(registry.get_strategies_for_domain("finance").is_empty());
    }

    #[test]
    fn unregister_missing_is_silent() {
        let mut registry = SteeringRegistry::new();
        registry.register(Arc::new(FixedStrategy::new("a", 0.5, &[])));

        registry.unregister("missing");
        registry.unregister("a");

        assert!(!registry.has_strategy("a"));
        assert!(registry.is_empty());
    }

    #[test]
    fn clear_removes_everything() {
        let mut registry = SteeringRegistry::new();
        registry.register(Arc::new(FixedStrategy::new("a", 0.5, &[])));
        registry.register(Arc::new(FixedStrategy::new("b", 0.5, &[])));

        registry.clear();

        assert_eq!(registry.len(), 0);
    }
}
