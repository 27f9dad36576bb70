//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the orchestration engine and its collaborators. Adapters implement these
//! ports.
//!
//! - `AgentStateStore` - TTL-bounded per-conversation working memory
//! - `ConversationStateRepository` - Append-only snapshot persistence
//! - `DomainStorage` - Per-domain record storage, query and aggregation
//! - `TextGenerator` - Language model collaborator

mod agent_state_store;
mod conversation_state_repository;
mod domain_storage;
mod text_generator;

pub use agent_state_store::{AgentStateError, AgentStateStore};
pub use conversation_state_repository::{ConversationStateRepository, StorageError};
pub use domain_storage::{
    AggregateBucket, AggregateConfig, DomainRecord, DomainStorage, DomainStorageError, Interval,
    Metric, MetricOp, QueryFilters,
};
pub use text_generator::{ChatMessage, GenerationError, GenerationRequest, TextGenerator};
