//! Agent state adapters.
//!
//! - **InMemoryAgentStateStore** - Lock-guarded record map with a current-record index
//! - **AgentStateSweeper** - Background purge of expired records

mod in_memory_store;
mod sweeper;

pub use in_memory_store::InMemoryAgentStateStore;
pub use sweeper::{AgentStateSweeper, AgentStateSweeperConfig, SweeperHandle};
