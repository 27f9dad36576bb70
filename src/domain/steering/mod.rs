//! Steering domain module.
//!
//! Strategy plugin contract, the registry that catalogs strategies, and the
//! merge that turns many hint sets into the one attached to the state.

mod errors;
mod hints;
pub mod merge;
mod registry;
mod strategy;

pub use errors::SteeringError;
pub use hints::{SteeringHints, MERGED_HINT_TYPE};
pub use merge::{merge_hints, ContextMergePolicy, MergeOptions};
pub use registry::SteeringRegistry;
pub use strategy::SteeringStrategy;
