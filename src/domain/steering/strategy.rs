//! Steering strategy plugin contract.

use async_trait::async_trait;

use crate::domain::conversation::ConversationState;
use crate::domain::foundation::Priority;

use super::{SteeringError, SteeringHints};

/// A plugin that, when applicable, proposes suggestions for the next turn.
///
/// Strategies are registered once at startup and evaluated concurrently by
/// the steering stage, so implementations must not rely on call ordering.
#[async_trait]
pub trait SteeringStrategy: Send + Sync {
    /// Unique key within the steering registry.
    fn strategy_id(&self) -> &str;

    /// Domains this strategy is associated with.
    ///
    /// Empty means the strategy is domain-agnostic.
    fn domain_ids(&self) -> &[String] {
        &[]
    }

    /// Influence weight used when merging hint sets.
    fn priority(&self) -> Priority;

    /// Pure applicability predicate.
    fn should_apply(&self, state: &ConversationState) -> bool;

    /// Produce hints for the given state without mutating it.
    async fn generate_hints(&self, state: &ConversationState) -> Result<SteeringHints, SteeringError>;
}
