//! Storage Adapters
//!
//! Implementations of the snapshot repository and domain storage ports.
//!
//! ## Available Adapters
//!
//! - **FileStateRepository** - Conversation snapshots as YAML files on disk
//! - **InMemoryStateRepository** - Conversation snapshots in memory
//! - **InMemoryDomainStorage** - Domain records in memory
//! - **FileDomainStorage** - Domain records in one YAML file per collection
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{FileStateRepository, InMemoryStateRepository};
//!
//! // Production: file-based storage
//! let repo = FileStateRepository::new("./data/conversations");
//!
//! // Testing: in-memory storage
//! let repo = InMemoryStateRepository::new();
//! ```

mod factory;
mod file_domain_storage;
mod file_state_repository;
mod in_memory_domain_storage;
mod in_memory_state_repository;

pub use factory::create_domain_storage;
pub use file_domain_storage::FileDomainStorage;
pub use file_state_repository::FileStateRepository;
pub use in_memory_domain_storage::InMemoryDomainStorage;
pub use in_memory_state_repository::InMemoryStateRepository;
