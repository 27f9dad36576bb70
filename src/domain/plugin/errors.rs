//! Error types for domain plugins.

use thiserror::Error;

/// Registration-time configuration errors. These abort startup.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Domain '{0}' is already registered")]
    DuplicateDomain(String),

    #[error("Unsupported storage type: {0}")]
    UnsupportedStorageType(String),

    #[error("Domain id cannot be empty")]
    EmptyDomainId,

    #[error("Unknown domain: {0}")]
    UnknownDomain(String),
}

/// Failure of a single domain extractor.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("Extraction failed for domain '{domain_id}': {reason}")]
    Failed { domain_id: String, reason: String },

    #[error("Extraction result does not match schema '{schema}': {reason}")]
    SchemaMismatch { schema: String, reason: String },
}

impl ExtractionError {
    pub fn failed(domain_id: impl Into<String>, reason: impl Into<String>) -> Self {
        ExtractionError::Failed {
            domain_id: domain_id.into(),
            reason: reason.into(),
        }
    }
}
