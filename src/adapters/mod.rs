//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the orchestration engine to its collaborators:
//! - `agent_state` - In-memory agent state store and its background sweeper
//! - `storage` - Snapshot repositories and domain record storage
//! - `ai` - Text generator implementations

pub mod agent_state;
pub mod ai;
pub mod storage;

pub use agent_state::{AgentStateSweeper, AgentStateSweeperConfig, InMemoryAgentStateStore, SweeperHandle};
pub use ai::MockTextGenerator;
pub use storage::{
    create_domain_storage, FileDomainStorage, FileStateRepository, InMemoryDomainStorage,
    InMemoryStateRepository,
};
