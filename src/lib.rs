//! Dialog Orchestrator - pluggable conversation orchestration engine
//!
//! Each user turn flows through a pipeline of stages that classify the
//! message into conversation modes, let domain plugins extract facts, merge
//! the hints of concurrently evaluated steering strategies, and plan a reply
//! that is generated per mode and composed with transition phrases.
//! Conversation state is an append-only series of snapshots; short-lived
//! multi-step memory lives in a TTL-bounded agent state store.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
