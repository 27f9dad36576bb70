//! Classification stage - assigns the turn's mode and segments.

use async_trait::async_trait;
use std::sync::Arc;

use super::{Stage, StageError, TurnContext};
use crate::domain::conversation::ConversationState;
use crate::domain::modes::{ModeClassifier, RuleBasedModeClassifier};

pub struct ClassificationStage {
    classifier: Arc<dyn ModeClassifier>,
}

impl Default for ClassificationStage {
    fn default() -> Self {
        Self::new(Arc::new(RuleBasedModeClassifier::new()))
    }
}

impl ClassificationStage {
    pub fn new(classifier: Arc<dyn ModeClassifier>) -> Self {
        Self { classifier }
    }
}

#[async_trait]
impl Stage for ClassificationStage {
    fn name(&self) -> &str {
        "classification"
    }

    async fn run(
        &self,
        state: &ConversationState,
        ctx: &mut TurnContext,
    ) -> Result<ConversationState, StageError> {
        let classification = self.classifier.classify(&ctx.message, state);

        tracing::debug!(
            conversation_id = %state.conversation_id,
            primary = %classification.primary,
            segments = classification.segments.len(),
            "Message classified"
        );

        let next = state.clone().with_mode(classification.primary);
        ctx.classification = Some(classification);
        Ok(next)
    }
}
