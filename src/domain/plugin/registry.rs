//! Domain Registry - catalog of domain plugin descriptors.
//!
//! Ids are unique for the lifetime of the registry: registering an id twice
//! is a configuration error and leaves the registry untouched. The order of
//! [`DomainRegistry::get_active_domains`] decides precedence whenever several
//! domains could act on the same turn.
//!
//! # Example
//!
//! ```
//! use dialog_orchestrator::domain::plugin::{DomainCapabilities, DomainDefinition, DomainRegistry};
//!
//! let mut registry = DomainRegistry::new();
//! registry
//!     .register(DomainDefinition::new("finance", "Finance", 5).with_capabilities(DomainCapabilities::all()))
//!     .unwrap();
//!
//! assert!(registry.register(DomainDefinition::new("finance", "Again", 1)).is_err());
//! assert_eq!(registry.get_active_domains().len(), 1);
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::{DomainDefinition, DomainExtractor, RegistryError};

struct Entry {
    definition: DomainDefinition,
    extractor: Option<Arc<dyn DomainExtractor>>,
    /// Registration sequence, the tie-breaker for equal priorities.
    seq: u64,
}

/// Catalog of domain plugins, owned by the application context.
#[derive(Default)]
pub struct DomainRegistry {
    domains: HashMap<String, Entry>,
    next_seq: u64,
}

impl fmt::Debug for DomainRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DomainRegistry")
            .field("domains", &self.get_all_domains().iter().map(|d| &d.id).collect::<Vec<_>>())
            .finish()
    }
}

/// Counts derived from the registered domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct DomainRegistryStats {
    pub total: usize,
    pub enabled: usize,
    pub disabled: usize,
    pub with_extraction: usize,
    pub with_steering: usize,
    pub with_summarization: usize,
}

impl DomainRegistry {
    /// Creates a new empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a domain descriptor.
    ///
    /// # Errors
    ///
    /// - `DuplicateDomain` if the id is already registered
    /// - `UnsupportedStorageType` if the storage backend is unknown
    /// - `EmptyDomainId` if the id is blank
    pub fn register(&mut self, definition: DomainDefinition) -> Result<(), RegistryError> {
        self.insert(definition, None)
    }

    /// Registers a domain descriptor together with its extractor.
    pub fn register_with_extractor(
        &mut self,
        definition: DomainDefinition,
        extractor: Arc<dyn DomainExtractor>,
    ) -> Result<(), RegistryError> {
        self.insert(definition, Some(extractor))
    }

    fn insert(
        &mut self,
        definition: DomainDefinition,
        extractor: Option<Arc<dyn DomainExtractor>>,
    ) -> Result<(), RegistryError> {
        if definition.id.trim().is_empty() {
            return Err(RegistryError::EmptyDomainId);
        }
        if self.domains.contains_key(&definition.id) {
            return Err(RegistryError::DuplicateDomain(definition.id));
        }
        let backend = definition.config.storage.backend()?;

        tracing::info!(
            domain_id = %definition.id,
            priority = definition.priority,
            enabled = definition.enabled,
            storage = %backend,
            has_extractor = extractor.is_some(),
            "Registered domain"
        );

        let seq = self.next_seq;
        self.next_seq += 1;
        self.domains.insert(
            definition.id.clone(),
            Entry {
                definition,
                extractor,
                seq,
            },
        );
        Ok(())
    }

    /// Removes a domain. Absent ids are ignored.
    pub fn unregister(&mut self, domain_id: &str) {
        if self.domains.remove(domain_id).is_some() {
            tracing::info!(domain_id = %domain_id, "Unregistered domain");
        }
    }

    /// Gets a domain definition by id.
    pub fn get_domain(&self, domain_id: &str) -> Option<&DomainDefinition> {
        self.domains.get(domain_id).map(|e| &e.definition)
    }

    /// Checks if a domain is registered.
    pub fn has_domain(&self, domain_id: &str) -> bool {
        self.domains.contains_key(domain_id)
    }

    /// All domains in registration order.
    pub fn get_all_domains(&self) -> Vec<&DomainDefinition> {
        let mut entries: Vec<&Entry> = self.domains.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| &e.definition).collect()
    }

    /// Enabled domains, highest priority first, ties in registration order.
    pub fn get_active_domains(&self) -> Vec<&DomainDefinition> {
        self.active_entries().into_iter().map(|e| &e.definition).collect()
    }

    /// Active domains that can extract and have an extractor attached,
    /// in precedence order.
    pub fn active_extractors(&self) -> Vec<(&DomainDefinition, Arc<dyn DomainExtractor>)> {
        self.active_entries()
            .into_iter()
            .filter(|e| e.definition.capabilities.extraction)
            .filter_map(|e| e.extractor.as_ref().map(|x| (&e.definition, Arc::clone(x))))
            .collect()
    }

    fn active_entries(&self) -> Vec<&Entry> {
        let mut entries: Vec<&Entry> = self
            .domains
            .values()
            .filter(|e| e.definition.enabled)
            .collect();
        entries.sort_by(|a, b| {
            b.definition
                .priority
                .cmp(&a.definition.priority)
                .then(a.seq.cmp(&b.seq))
        });
        entries
    }

    /// Counts by status and capability.
    pub fn get_stats(&self) -> DomainRegistryStats {
        self.domains
            .values()
            .map(|e| &e.definition)
            .fold(DomainRegistryStats::default(), |mut stats, def| {
                stats.total += 1;
                if def.enabled {
                    stats.enabled += 1;
                } else {
                    stats.disabled += 1;
                }
                stats.with_extraction += usize::from(def.capabilities.extraction);
                stats.with_steering += usize::from(def.capabilities.steering);
                stats.with_summarization += usize::from(def.capabilities.summarization);
                stats
            })
    }

    /// Number of registered domains.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    /// True when nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }

    /// Removes every domain.
    pub fn clear(&mut self) {
        self.domains.clear();
    }
}
