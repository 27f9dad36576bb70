//! Stage pipeline - the per-turn sequence of state transformations.
//!
//! Stages run strictly in order. Each receives the state produced by the
//! previous stage and the shared [`TurnContext`]. A failing stage either
//! passes its input through (fail-open) or ends the run (abort), according to
//! its [`FailurePolicy`].

mod classification;
mod composition;
mod extraction;
mod steering;

pub use classification::ClassificationStage;
pub use composition::CompositionStage;
pub use extraction::{ExtractionStage, TRIGGERED_DOMAINS_KEY};
pub use steering::SteeringStage;

use async_trait::async_trait;
use std::sync::Arc;
use thiserror::Error;

use crate::domain::conversation::{ConversationMode, ConversationState};
use crate::domain::foundation::Timestamp;
use crate::domain::modes::{ModeClassification, ModeHandler, ModeSegment, SystemPromptBuilder};

/// What happens to the turn when a stage fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Log the failure and continue with the stage's input state.
    #[default]
    FailOpen,
    /// Stop the pipeline and report the failure.
    Abort,
}

/// Stage failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum StageError {
    #[error("Stage '{stage}' failed: {reason}")]
    Failed { stage: String, reason: String },
}

impl StageError {
    pub fn failed(stage: impl Into<String>, reason: impl Into<String>) -> Self {
        StageError::Failed {
            stage: stage.into(),
            reason: reason.into(),
        }
    }
}

/// Pipeline failure.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PipelineError {
    #[error("Pipeline aborted at stage '{stage}': {source}")]
    StageAborted {
        stage: String,
        #[source]
        source: StageError,
    },
}

/// Per-turn data shared by the stages.
#[derive(Debug, Clone)]
pub struct TurnContext {
    pub message: String,
    pub now: Timestamp,
    /// Set by the classification stage.
    pub classification: Option<ModeClassification>,
    /// Set by the composition stage.
    pub plan: Option<ResponsePlan>,
    /// Stages that failed open this turn.
    pub failed_stages: Vec<String>,
}

impl TurnContext {
    pub fn new(message: impl Into<String>, now: Timestamp) -> Self {
        Self {
            message: message.into(),
            now,
            classification: None,
            plan: None,
            failed_stages: Vec::new(),
        }
    }

    /// Segments to answer: the classification's, or the whole message in
    /// the state's mode when classification did not run.
    pub fn segments(&self, state: &ConversationState) -> Vec<ModeSegment> {
        match &self.classification {
            Some(c) if !c.segments.is_empty() => c.segments.clone(),
            _ => vec![ModeSegment::new(state.mode, self.message.trim())],
        }
    }
}

/// One reply segment to generate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedSegment {
    pub mode: ConversationMode,
    pub text: String,
    pub system_prompt: String,
}

/// Ordered segments the reply is generated from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponsePlan {
    pub segments: Vec<PlannedSegment>,
}

impl ResponsePlan {
    /// Plan one segment per mode segment, each with its mode's prompt.
    pub fn for_segments(segments: &[ModeSegment], state: &ConversationState) -> Self {
        Self {
            segments: segments
                .iter()
                .map(|segment| PlannedSegment {
                    mode: segment.mode,
                    text: segment.text.clone(),
                    system_prompt: ModeHandler::for_mode(segment.mode).build_system_prompt(state),
                })
                .collect(),
        }
    }
}

/// One step of the turn pipeline.
#[async_trait]
pub trait Stage: Send + Sync {
    fn name(&self) -> &str;

    fn failure_policy(&self) -> FailurePolicy {
        FailurePolicy::FailOpen
    }

    async fn run(
        &self,
        state: &ConversationState,
        ctx: &mut TurnContext,
    ) -> Result<ConversationState, StageError>;
}

/// Ordered stages.
#[derive(Clone, Default)]
pub struct StagePipeline {
    stages: Vec<Arc<dyn Stage>>,
}

impl std::fmt::Debug for StagePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StagePipeline")
            .field("stages", &self.stage_names())
            .finish()
    }
}

impl StagePipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a stage.
    pub fn with_stage(mut self, stage: Arc<dyn Stage>) -> Self {
        self.stages.push(stage);
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Run every stage in order.
    ///
    /// # Errors
    ///
    /// `PipelineError::StageAborted` when a stage with the `Abort` policy fails.
    pub async fn run(
        &self,
        state: ConversationState,
        ctx: &mut TurnContext,
    ) -> Result<ConversationState, PipelineError> {
        let mut current = state;

        for stage in &self.stages {
            match stage.run(&current, ctx).await {
                Ok(next) => current = next,
                Err(error) => match stage.failure_policy() {
                    FailurePolicy::FailOpen => {
                        tracing::warn!(
                            stage = stage.name(),
                            conversation_id = %current.conversation_id,
                            error = %error,
                            "Stage failed, continuing with its input state"
                        );
                        ctx.failed_stages.push(stage.name().to_string());
                    }
                    FailurePolicy::Abort => {
                        tracing::error!(
                            stage = stage.name(),
                            conversation_id = %current.conversation_id,
                            error = %error,
                            "Stage failed, aborting turn"
                        );
                        return Err(PipelineError::StageAborted {
                            stage: stage.name().to_string(),
                            source: error,
                        });
                    }
                },
            }
        }

        Ok(current)
    }
}
