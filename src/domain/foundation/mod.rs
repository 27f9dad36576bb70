//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, the injectable clock and error types
//! that form the vocabulary of the orchestration engine.

mod clock;
mod errors;
mod ids;
mod priority;
mod timestamp;

pub use clock::{Clock, ManualClock, SystemClock};
pub use errors::ValidationError;
pub use ids::{AgentStateId, ConversationId, GoalId, RecordId, SnapshotId, UserId};
pub use priority::Priority;
pub use timestamp::Timestamp;
