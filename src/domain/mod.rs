//! Domain layer containing orchestration logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (IDs, timestamps, priority, clock, errors)
//! - `conversation` - Conversation-state snapshots and modes
//! - `plugin` - Domain plugin descriptors, extractors and their registry
//! - `steering` - Steering strategies, their registry and hint merging
//! - `agent_state` - TTL-bounded working-memory records
//! - `modes` - Mode classification, per-mode prompts and reply composition

pub mod agent_state;
pub mod conversation;
pub mod foundation;
pub mod modes;
pub mod plugin;
pub mod steering;
