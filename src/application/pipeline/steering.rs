//! Steering stage - evaluates steering strategies concurrently and merges
//! their hints into the snapshot.
//!
//! Every applicable strategy runs on its own task against a shared,
//! read-only snapshot. Failures, timeouts and panics are isolated per
//! strategy: they are logged and excluded from the merge, never allowed to
//! blank the hints of the strategies that succeeded.

use async_trait::async_trait;
use futures::future::join_all;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;

use super::{Stage, StageError, TurnContext};
use crate::domain::conversation::ConversationState;
use crate::domain::plugin::DomainRegistry;
use crate::domain::steering::{
    merge_hints, MergeOptions, SteeringError, SteeringHints, SteeringRegistry, SteeringStrategy,
};

pub struct SteeringStage {
    strategies: Arc<SteeringRegistry>,
    domains: Arc<DomainRegistry>,
    options: MergeOptions,
    timeout: Option<Duration>,
}

impl SteeringStage {
    pub fn new(strategies: Arc<SteeringRegistry>, domains: Arc<DomainRegistry>) -> Self {
        Self {
            strategies,
            domains,
            options: MergeOptions::default(),
            timeout: None,
        }
    }

    pub fn with_options(mut self, options: MergeOptions) -> Self {
        self.options = options;
        self
    }

    /// Bound each strategy's hint generation.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    /// A strategy tied to domains only runs when one of them is enabled and
    /// steering-capable.
    fn domain_allows(&self, strategy: &dyn SteeringStrategy) -> bool {
        let domain_ids = strategy.domain_ids();
        domain_ids.is_empty()
            || domain_ids.iter().any(|id| {
                self.domains
                    .get_domain(id)
                    .map(|d| d.enabled && d.capabilities.steering)
                    .unwrap_or(false)
            })
    }

    /// `should_apply` guarded against panics; a panicking predicate counts
    /// as not applicable.
    fn applies(strategy: &dyn SteeringStrategy, state: &ConversationState) -> bool {
        match catch_unwind(AssertUnwindSafe(|| strategy.should_apply(state))) {
            Ok(applies) => applies,
            Err(_) => {
                tracing::warn!(
                    strategy_id = %strategy.strategy_id(),
                    conversation_id = %state.conversation_id,
                    "Steering strategy panicked in should_apply, skipping"
                );
                false
            }
        }
    }

    async fn evaluate(
        strategy: Arc<dyn SteeringStrategy>,
        state: Arc<ConversationState>,
        timeout: Option<Duration>,
    ) -> Result<SteeringHints, SteeringError> {
        let strategy_id = strategy.strategy_id().to_string();
        let task = tokio::spawn(async move { strategy.generate_hints(&state).await });
        let abort = task.abort_handle();

        let joined = match timeout {
            Some(limit) => match tokio::time::timeout(limit, task).await {
                Ok(joined) => joined,
                Err(_) => {
                    abort.abort();
                    return Err(SteeringError::Timeout {
                        strategy_id,
                        timeout_ms: limit.as_millis() as u64,
                    })
                }
            },
            None => task.await,
        };

        joined.map_err(|_| SteeringError::Panicked { strategy_id })?
    }
}

#[async_trait]
impl Stage for SteeringStage {
    fn name(&self) -> &str {
        "steering"
    }

    async fn run(
        &self,
        state: &ConversationState,
        _ctx: &mut TurnContext,
    ) -> Result<ConversationState, StageError> {
        let applicable: Vec<Arc<dyn SteeringStrategy>> = self
            .strategies
            .get_all_strategies()
            .into_iter()
            .filter(|s| self.domain_allows(s.as_ref()) && Self::applies(s.as_ref(), state))
            .collect();

        if applicable.is_empty() {
            return Ok(state.clone());
        }

        let snapshot = Arc::new(state.clone());
        let results = join_all(
            applicable
                .iter()
                .map(|s| Self::evaluate(Arc::clone(s), Arc::clone(&snapshot), self.timeout)),
        )
        .await;

        let mut hint_sets = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(hints) => hint_sets.push(hints),
                Err(error) => {
                    tracing::warn!(
                        strategy_id = %error.strategy_id(),
                        conversation_id = %state.conversation_id,
                        error = %error,
                        "Steering strategy failed"
                    );
                }
            }
        }

        let mut next = state.clone();
        if let Some(merged) = merge_hints(hint_sets, &self.options) {
            tracing::debug!(
                conversation_id = %state.conversation_id,
                hint_type = %merged.hint_type,
                suggestions = merged.suggestions.len(),
                "Steering hints merged"
            );
            next.set_steering_hints(merged);
        }
        Ok(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::pipeline::StagePipeline;
    use crate::domain::foundation::{ConversationId, Priority, Timestamp};
    use crate::domain::plugin::{DomainCapabilities, DomainDefinition};
    use crate::domain::steering::MERGED_HINT_TYPE;

    enum Behavior {
        Suggest(&'static [&'static str]),
        Fail,
        Hang,
        Panic,
        PanicOnApply,
        Slow(u64),
    }

    struct TestStrategy {
        id: &'static str,
        priority: f64,
        domains: Vec<String>,
        applies: bool,
        behavior: Behavior,
    }

    impl TestStrategy {
        fn suggesting(id: &'static str, priority: f64, suggestions: &'static [&'static str]) -> Self {
            Self {
                id,
                priority,
                domains: Vec::new(),
                applies: true,
                behavior: Behavior::Suggest(suggestions),
            }
        }

        fn behaving(id: &'static str, behavior: Behavior) -> Self {
            Self {
                behavior,
                ..Self::suggesting(id, 0.5, &[])
            }
        }

        fn for_domain(mut self, domain: &str) -> Self {
            self.domains.push(domain.to_string());
            self
        }
    }

    #[async_trait]
    impl SteeringStrategy for TestStrategy {
        fn strategy_id(&self) -> &str {
            self.id
        }

        fn domain_ids(&self) -> &[String] {
            &self.domains
        }

        fn priority(&self) -> Priority {
            Priority::new(self.priority)
        }

        fn should_apply(&self, _state: &ConversationState) -> bool {
            if matches!(self.behavior, Behavior::PanicOnApply) {
                panic!("predicate bug");
            }
            self.applies
        }

        async fn generate_hints(&self, _state: &ConversationState) -> Result<SteeringHints, SteeringError> {
            match &self.behavior {
                Behavior::Suggest(suggestions) => Ok(SteeringHints::new(
                    self.id,
                    suggestions.iter().map(|s| s.to_string()).collect(),
                    self.priority,
                )),
                Behavior::Fail => Err(SteeringError::generation_failed(self.id, "boom")),
                Behavior::Hang => {
                    tokio::time::sleep(Duration::from_secs(30)).await;
                    Ok(SteeringHints::new(self.id, vec!["late".into()], self.priority))
                }
                Behavior::Panic | Behavior::PanicOnApply => panic!("strategy exploded"),
                Behavior::Slow(ms) => {
                    tokio::time::sleep(Duration::from_millis(*ms)).await;
                    Ok(SteeringHints::new(self.id, vec![format!("{} tip", self.id)], self.priority))
                }
            }
        }
    }

    fn stage(strategies: Vec<TestStrategy>) -> SteeringStage {
        stage_with_domains(strategies, DomainRegistry::new())
    }

    fn stage_with_domains(strategies: Vec<TestStrategy>, domains: DomainRegistry) -> SteeringStage {
        let mut registry = SteeringRegistry::new();
        for strategy in strategies {
            registry.register(Arc::new(strategy));
        }
        SteeringStage::new(Arc::new(registry), Arc::new(domains))
    }

    async fn run(stage: &SteeringStage) -> ConversationState {
        let state = ConversationState::new(ConversationId::new());
        let mut ctx = TurnContext::new("hello", Timestamp::now());
        stage.run(&state, &mut ctx).await.unwrap()
    }

    #[tokio::test]
    async fn no_strategies_leaves_hints_empty() {
        let next = run(&stage(vec![])).await;
        assert!(next.steering_hints.is_none());
    }

    #[tokio::test]
    async fn inapplicable_strategies_leave_hints_empty() {
        let mut quiet = TestStrategy::suggesting("quiet", 0.9, &["never"]);
        quiet.applies = false;

        let next = run(&stage(vec![quiet])).await;

        assert!(next.steering_hints.is_none());
    }

    #[tokio::test]
    async fn merges_hints_from_applicable_strategies() {
        let next = run(&stage(vec![
            TestStrategy::suggesting("low", 0.2, &["Check savings", "Review goals"]),
            TestStrategy::suggesting("high", 0.8, &["Set a budget", "check savings"]),
        ]))
        .await;

        let hints = next.steering_hints.unwrap();
        assert_eq!(hints.hint_type, MERGED_HINT_TYPE);
        assert_eq!(hints.suggestions, vec!["Set a budget", "check savings", "Review goals"]);
        assert_eq!(hints.priority, Priority::new(0.8));
    }

    #[tokio::test]
    async fn single_strategy_keeps_its_hint_type() {
        let next = run(&stage(vec![TestStrategy::suggesting("solo", 0.4, &["One thing"])])).await;

        assert_eq!(next.steering_hints.unwrap().hint_type, "solo");
    }

    #[tokio::test]
    async fn failing_strategy_does_not_blank_the_others() {
        let next = run(&stage(vec![
            TestStrategy::behaving("broken", Behavior::Fail),
            TestStrategy::suggesting("ok", 0.3, &["Keep going"]),
        ]))
        .await;

        assert_eq!(next.steering_hints.unwrap().suggestions, vec!["Keep going"]);
    }

    #[tokio::test]
    async fn panicking_strategy_is_isolated() {
        let next = run(&stage(vec![
            TestStrategy::behaving("explodes", Behavior::Panic),
            TestStrategy::suggesting("ok", 0.3, &["Still here"]),
        ]))
        .await;

        assert_eq!(next.steering_hints.unwrap().suggestions, vec!["Still here"]);
    }

    #[tokio::test]
    async fn panicking_predicate_is_treated_as_not_applicable() {
        let next = run(&stage(vec![
            TestStrategy::behaving("bad_predicate", Behavior::PanicOnApply),
            TestStrategy::suggesting("ok", 0.3, &["Still here"]),
        ]))
        .await;

        assert_eq!(next.steering_hints.unwrap().suggestions, vec!["Still here"]);
    }

    #[tokio::test]
    async fn panicking_predicate_does_not_abort_pipeline() {
        let pipeline = StagePipeline::new().with_stage(Arc::new(stage(vec![TestStrategy::behaving(
            "bad_predicate",
            Behavior::PanicOnApply,
        )])));
        let state = ConversationState::new(ConversationId::new());
        let mut ctx = TurnContext::new("hello", Timestamp::now());

        let next = pipeline.run(state, &mut ctx).await.unwrap();

        assert!(next.steering_hints.is_none());
        assert!(ctx.failed_stages.is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn strategies_generate_hints_concurrently() {
        let stage = stage(vec![
            TestStrategy::behaving("first", Behavior::Slow(200)),
            TestStrategy::behaving("second", Behavior::Slow(200)),
        ]);

        let started = std::time::Instant::now();
        let next = run(&stage).await;
        let elapsed = started.elapsed();

        assert!(elapsed < Duration::from_millis(350), "took {elapsed:?}");
        assert_eq!(next.steering_hints.unwrap().suggestions.len(), 2);
    }

    #[tokio::test]
    async fn slow_strategy_times_out() {
        let stage = stage(vec![
            TestStrategy::behaving("slow", Behavior::Hang),
            TestStrategy::suggesting("fast", 0.3, &["Quick tip"]),
        ])
        .with_timeout(Some(Duration::from_millis(100)));

        let next = run(&stage).await;

        assert_eq!(next.steering_hints.unwrap().suggestions, vec!["Quick tip"]);
    }

    #[tokio::test]
    async fn all_failures_leave_hints_empty() {
        let next = run(&stage(vec![TestStrategy::behaving("broken", Behavior::Fail)])).await;
        assert!(next.steering_hints.is_none());
    }

    #[tokio::test]
    async fn domain_bound_strategy_needs_steering_domain() {
        let mut domains = DomainRegistry::new();
        domains
            .register(DomainDefinition::new("finance", "Finance", 1).with_capabilities(DomainCapabilities::all()))
            .unwrap();
        domains
            .register(DomainDefinition::new("travel", "Travel", 1).with_capabilities(DomainCapabilities::all()).disabled())
            .unwrap();

        let next = run(&stage_with_domains(
            vec![
                TestStrategy::suggesting("finance.tip", 0.5, &["Budget"]).for_domain("finance"),
                TestStrategy::suggesting("travel.tip", 0.9, &["Pack light"]).for_domain("travel"),
                TestStrategy::suggesting("health.tip", 0.9, &["Sleep"]).for_domain("health"),
            ],
            domains,
        ))
        .await;

        assert_eq!(next.steering_hints.unwrap().suggestions, vec!["Budget"]);
    }
}
