//! ConversationOrchestrator - processes one user turn end to end.
//!
//! A turn:
//! 1. Loads the latest snapshot (or starts a new one when absent or forced)
//! 2. Derives the next snapshot and records the user message
//! 3. Runs the stage pipeline
//! 4. Persists the processed snapshot
//! 5. Generates one text per planned segment and composes the reply
//! 6. Persists a final snapshot carrying the assistant reply

use futures::future::join_all;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::conversation::{ConversationState, MessageRole};
use crate::domain::foundation::ConversationId;
use crate::domain::modes::{compose_response, ModeClassification, SegmentOutput};
use crate::ports::{
    AgentStateError, ChatMessage, GenerationError, GenerationRequest, StorageError,
};

use super::context::AppContext;
use super::pipeline::{PipelineError, ResponsePlan, StagePipeline, TurnContext};

/// One user message to process.
#[derive(Debug, Clone)]
pub struct TurnRequest {
    pub conversation_id: ConversationId,
    pub message: String,
    /// Start from a fresh snapshot even if the conversation has history.
    pub force_new: bool,
}

impl TurnRequest {
    pub fn new(conversation_id: ConversationId, message: impl Into<String>) -> Self {
        Self {
            conversation_id,
            message: message.into(),
            force_new: false,
        }
    }

    pub fn fresh(mut self) -> Self {
        self.force_new = true;
        self
    }
}

/// Result of a processed turn.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub reply: String,
    /// The final persisted snapshot, assistant reply included.
    pub state: ConversationState,
    pub classification: Option<ModeClassification>,
}

#[derive(Debug, Error)]
pub enum OrchestratorError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    #[error("Agent state error: {0}")]
    AgentState(#[from] AgentStateError),
}

pub struct ConversationOrchestrator {
    context: Arc<AppContext>,
    pipeline: StagePipeline,
}

impl ConversationOrchestrator {
    /// Orchestrator running the standard pipeline.
    pub fn new(context: Arc<AppContext>) -> Self {
        let pipeline = context.standard_pipeline();
        Self { context, pipeline }
    }

    pub fn with_pipeline(context: Arc<AppContext>, pipeline: StagePipeline) -> Self {
        Self { context, pipeline }
    }

    pub fn context(&self) -> &Arc<AppContext> {
        &self.context
    }

    /// Process one user turn.
    ///
    /// # Errors
    ///
    /// - `Storage` if a snapshot cannot be loaded or persisted; no reply is generated
    /// - `Pipeline` if a stage with the abort policy fails
    /// - `Generation` if any reply segment fails to generate
    /// - `AgentState` if clearing a forced-new conversation's agent state fails
    pub async fn process_turn(&self, request: TurnRequest) -> Result<TurnOutcome, OrchestratorError> {
        let ctx = &self.context;
        let conversation_id = request.conversation_id;
        let window = ctx.config.conversation.history_window;
        let now = ctx.clock.now();

        let previous = ctx.repository.latest(conversation_id).await?;

        let mut state = match previous {
            Some(latest) if !request.force_new => latest.next_snapshot_at(now),
            latest => {
                if request.force_new {
                    let cleared = ctx.agent_state.clear_conversation_states(conversation_id).await?;
                    tracing::info!(
                        conversation_id = %conversation_id,
                        cleared_agent_states = cleared,
                        "Starting conversation from a fresh snapshot"
                    );
                }
                // A fresh start must still sort after the conversation's existing snapshots.
                let created_at = latest.map_or(now, |l| l.created_after(now));
                ConversationState::new_at(conversation_id, created_at)
            }
        };
        let now = state.created_at;
        state.record_message(MessageRole::User, request.message.as_str(), now, window);

        let mut turn = TurnContext::new(request.message, now);
        let processed = self.pipeline.run(state, &mut turn).await?;

        ctx.repository.append(&processed).await?;

        let plan = match turn.plan.take() {
            Some(plan) => plan,
            None => ResponsePlan::for_segments(&turn.segments(&processed), &processed),
        };
        let reply = self.generate_reply(&processed, &plan).await?;

        let replied_at = ctx.clock.now();
        let mut final_state = processed.revision_at(replied_at);
        final_state.record_message(MessageRole::Assistant, reply.as_str(), replied_at, window);
        ctx.repository.append(&final_state).await?;

        tracing::info!(
            conversation_id = %conversation_id,
            mode = %final_state.mode,
            segments = plan.segments.len(),
            failed_stages = ?turn.failed_stages,
            has_steering = final_state.steering_hints.is_some(),
            "Turn processed"
        );

        Ok(TurnOutcome {
            reply,
            state: final_state,
            classification: turn.classification,
        })
    }

    /// Snapshots of a conversation, most recent first.
    pub async fn history(
        &self,
        conversation_id: ConversationId,
        limit: usize,
    ) -> Result<Vec<ConversationState>, OrchestratorError> {
        Ok(self.context.repository.history(conversation_id, limit).await?)
    }

    /// Generate every planned segment concurrently and compose them in plan order.
    async fn generate_reply(
        &self,
        state: &ConversationState,
        plan: &ResponsePlan,
    ) -> Result<String, OrchestratorError> {
        // The user message just recorded is sent separately as the request message.
        let prior = state.message_history.len().saturating_sub(1);
        let history: Vec<ChatMessage> = state.message_history[..prior]
            .iter()
            .map(ChatMessage::from)
            .collect();

        let generator = &self.context.generator;
        let results = join_all(plan.segments.iter().map(|segment| {
            let request = GenerationRequest::new(
                segment.mode,
                segment.system_prompt.clone(),
                segment.text.clone(),
            )
            .with_history(history.clone());
            async move {
                generator
                    .generate(request)
                    .await
                    .map(|text| SegmentOutput::new(segment.mode, text))
            }
        }))
        .await;

        let outputs = results.into_iter().collect::<Result<Vec<_>, _>>().map_err(|error| {
            tracing::warn!(
                conversation_id = %state.conversation_id,
                error = %error,
                "Reply generation failed"
            );
            error
        })?;

        Ok(compose_response(
            &outputs,
            &self.context.config.composition.transition_config(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::MockTextGenerator;
    use crate::config::AppConfig;
    use crate::domain::conversation::ConversationMode;
    use crate::domain::foundation::ManualClock;

    fn orchestrator(generator: MockTextGenerator) -> (ConversationOrchestrator, Arc<MockTextGenerator>) {
        let generator = Arc::new(generator);
        let context = AppContext::builder(AppConfig::default(), generator.clone())
            .build()
            .unwrap();
        (ConversationOrchestrator::new(Arc::new(context)), generator)
    }

    #[tokio::test]
    async fn first_turn_creates_and_persists_snapshots() {
        let (orchestrator, _) = orchestrator(MockTextGenerator::new().with_response("Consider an index fund."));
        let conv = ConversationId::new();

        let outcome = orchestrator
            .process_turn(TurnRequest::new(conv, "Should I invest my savings?"))
            .await
            .unwrap();

        assert_eq!(outcome.reply, "Consider an index fund.");
        assert_eq!(outcome.state.mode, ConversationMode::Consult);
        assert_eq!(outcome.state.message_history.len(), 2);
        assert_eq!(outcome.state.message_history[1].role, MessageRole::Assistant);

        let history = orchestrator.history(conv, 10).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].id, outcome.state.id);
    }

    #[tokio::test]
    async fn later_turns_send_prior_history() {
        let (orchestrator, generator) = orchestrator(MockTextGenerator::new());
        let conv = ConversationId::new();

        orchestrator
            .process_turn(TurnRequest::new(conv, "Should I rent or buy?"))
            .await
            .unwrap();
        orchestrator
            .process_turn(TurnRequest::new(conv, "What about interest rates?"))
            .await
            .unwrap();

        let calls = generator.get_calls();
        assert_eq!(calls.len(), 2);
        assert!(calls[0].history.is_empty());
        assert_eq!(
            calls[1].history,
            vec![
                ChatMessage::user("Should I rent or buy?"),
                ChatMessage::assistant("Mock response"),
            ]
        );
        assert_eq!(calls[1].message, "What about interest rates?");
    }

    #[tokio::test]
    async fn force_new_starts_an_empty_history() {
        let (orchestrator, _) = orchestrator(MockTextGenerator::new());
        let conv = ConversationId::new();

        orchestrator
            .process_turn(TurnRequest::new(conv, "Should I rent or buy?"))
            .await
            .unwrap();
        let outcome = orchestrator
            .process_turn(TurnRequest::new(conv, "Let's start over").fresh())
            .await
            .unwrap();

        assert_eq!(outcome.state.message_history.len(), 2);
        assert_eq!(outcome.state.message_history[0].content, "Let's start over");
    }

    #[tokio::test]
    async fn force_new_sorts_after_existing_snapshots_with_frozen_clock() {
        let clock = Arc::new(ManualClock::starting_now());
        let context = AppContext::builder(AppConfig::default(), Arc::new(MockTextGenerator::new()))
            .with_clock(clock)
            .build()
            .unwrap();
        let orchestrator = ConversationOrchestrator::new(Arc::new(context));
        let conv = ConversationId::new();

        let first = orchestrator
            .process_turn(TurnRequest::new(conv, "Should I rent or buy?"))
            .await
            .unwrap();
        let fresh = orchestrator
            .process_turn(TurnRequest::new(conv, "Let's start over").fresh())
            .await
            .unwrap();

        let history = orchestrator.history(conv, 10).await.unwrap();
        assert_eq!(history.len(), 4);
        assert_eq!(history[0].id, fresh.state.id);
        assert!(history[1].created_at.is_after(&first.state.created_at));
        assert_eq!(history[1].message_history.len(), 1);
        assert_eq!(history[1].message_history[0].content, "Let's start over");
    }

    #[tokio::test]
    async fn generation_failure_propagates() {
        let (orchestrator, _) = orchestrator(
            MockTextGenerator::new().with_error(GenerationError::unavailable("offline")),
        );

        let result = orchestrator
            .process_turn(TurnRequest::new(ConversationId::new(), "Should I invest?"))
            .await;

        assert!(matches!(
            result,
            Err(OrchestratorError::Generation(GenerationError::Unavailable { .. }))
        ));
    }
}
