//! Agent state module.
//!
//! TTL-bounded records that let a domain plugin carry short-lived working
//! memory across turns. Expiry and activity are pure functions of an
//! injected "now".

mod record;

pub use record::{is_active, is_expired, merge_data, AgentState};
