//! Composition stage - turns the classified segments into a response plan.

use async_trait::async_trait;

use super::{ResponsePlan, Stage, StageError, TurnContext};
use crate::domain::conversation::ConversationState;

#[derive(Debug, Default)]
pub struct CompositionStage;

impl CompositionStage {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Stage for CompositionStage {
    fn name(&self) -> &str {
        "composition"
    }

    async fn run(
        &self,
        state: &ConversationState,
        ctx: &mut TurnContext,
    ) -> Result<ConversationState, StageError> {
        let segments = ctx.segments(state);
        ctx.plan = Some(ResponsePlan::for_segments(&segments, state));
        Ok(state.clone())
    }
}
