//! Domain plugin module.
//!
//! Descriptors for pluggable topic areas, the extraction capability they may
//! implement, and the registry that orders them by precedence.

mod definition;
mod errors;
mod extractor;
mod registry;

pub use definition::{
    DomainCapabilities, DomainConfig, DomainDefinition, StorageBackend, StorageConfig,
};
pub use errors::{ExtractionError, RegistryError};
pub use extractor::{DomainExtractor, ExtractionContext};
pub use registry::{DomainRegistry, DomainRegistryStats};
