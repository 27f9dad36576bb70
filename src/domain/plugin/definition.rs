//! Domain plugin descriptors.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::RegistryError;

/// Descriptor of a pluggable topic area (finance, health, ...).
///
/// Registered once, read many times. `id` is unique within a registry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DomainDefinition {
    pub id: String,
    pub name: String,
    pub description: String,
    /// Higher means more influence when several domains act on a turn.
    pub priority: i32,
    pub enabled: bool,
    pub capabilities: DomainCapabilities,
    #[serde(default)]
    pub config: DomainConfig,
}

impl DomainDefinition {
    /// Creates an enabled definition with no capabilities and default config.
    pub fn new(id: impl Into<String>, name: impl Into<String>, priority: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            priority,
            enabled: true,
            capabilities: DomainCapabilities::default(),
            config: DomainConfig::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_capabilities(mut self, capabilities: DomainCapabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_config(mut self, config: DomainConfig) -> Self {
        self.config = config;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// What a domain plugin can do.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DomainCapabilities {
    #[serde(default)]
    pub extraction: bool,
    #[serde(default)]
    pub steering: bool,
    #[serde(default)]
    pub summarization: bool,
}

impl DomainCapabilities {
    /// Every capability switched on.
    pub fn all() -> Self {
        Self {
            extraction: true,
            steering: true,
            summarization: true,
        }
    }

    /// Only extraction.
    pub fn extraction_only() -> Self {
        Self {
            extraction: true,
            ..Self::default()
        }
    }
}

/// Per-domain configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DomainConfig {
    /// Reference to the schema extraction results conform to.
    #[serde(default)]
    pub extraction_schema: Option<String>,
    /// Keywords that make this domain relevant to a message.
    #[serde(default)]
    pub steering_triggers: Vec<String>,
    #[serde(default)]
    pub storage: StorageConfig,
}

impl DomainConfig {
    /// True when the message mentions one of the trigger keywords.
    pub fn is_triggered_by(&self, message: &str) -> bool {
        let lowercase = message.to_lowercase();
        self.steering_triggers
            .iter()
            .map(|t| t.trim().to_lowercase())
            .any(|t| !t.is_empty() && lowercase.contains(&t))
    }
}

/// Where a domain keeps its facts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct StorageConfig {
    /// Backend name, parsed into [`StorageBackend`] at registration time.
    pub backend: String,
    /// Optional collection / directory name; defaults to the domain id.
    #[serde(default)]
    pub collection: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory.as_str().to_string(),
            collection: None,
        }
    }
}

impl StorageConfig {
    /// Parses the configured backend name.
    pub fn backend(&self) -> Result<StorageBackend, RegistryError> {
        self.backend.parse()
    }
}

/// Closed set of storage backends a domain may use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Process-local, lost on restart.
    Memory,
    /// YAML documents on the local filesystem.
    File,
}

impl StorageBackend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::File => "file",
        }
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StorageBackend {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "file" | "yaml" => Ok(Self::File),
            other => Err(RegistryError::UnsupportedStorageType(other.to_string())),
        }
    }
}
