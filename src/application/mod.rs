//! Application layer - turn processing and the context that wires it.
//!
//! The orchestrator coordinates the domain (modes, steering, plugins)
//! with the ports (snapshot repository, agent state, text generation) for
//! each user turn. The stage pipeline is the per-turn transformation chain.

mod context;
mod orchestrator;
pub mod pipeline;

pub use context::{AppContext, AppContextBuilder};
pub use orchestrator::{ConversationOrchestrator, OrchestratorError, TurnOutcome, TurnRequest};
pub use pipeline::{
    FailurePolicy, PipelineError, PlannedSegment, ResponsePlan, Stage, StageError, StagePipeline,
    TurnContext,
};
