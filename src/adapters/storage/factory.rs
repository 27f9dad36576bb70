//! Construction-time selection of a domain storage backend.

use std::path::Path;
use std::sync::Arc;

use crate::domain::plugin::{RegistryError, StorageBackend, StorageConfig};
use crate::ports::DomainStorage;

use super::{FileDomainStorage, InMemoryDomainStorage};

/// Build the storage backend a domain's configuration names.
///
/// File collections default to the domain id and live under `data_dir`.
///
/// # Errors
///
/// `RegistryError::UnsupportedStorageType` if the backend is unknown.
pub fn create_domain_storage(
    domain_id: &str,
    config: &StorageConfig,
    data_dir: &Path,
) -> Result<Arc<dyn DomainStorage>, RegistryError> {
    let storage: Arc<dyn DomainStorage> = match config.backend()? {
        StorageBackend::Memory => Arc::new(InMemoryDomainStorage::new()),
        StorageBackend::File => {
            let collection = config.collection.as_deref().unwrap_or(domain_id);
            Arc::new(FileDomainStorage::new(data_dir, collection))
        }
    };
    tracing::debug!(domain_id = %domain_id, backend = %config.backend, "Domain storage created");
    Ok(storage)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::{DomainRecord, QueryFilters};
    use serde_json::json;
    use tempfile::TempDir;

    fn config(backend: &str) -> StorageConfig {
        StorageConfig {
            backend: backend.into(),
            collection: None,
        }
    }

    #[tokio::test]
    async fn memory_backend_is_usable() {
        let storage = create_domain_storage("finance", &config("memory"), Path::new(".")).unwrap();
        storage.store(DomainRecord::new(json!({"a": 1}))).await.unwrap();
        assert_eq!(storage.count(&QueryFilters::new()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn file_backend_uses_domain_id_as_collection() {
        let temp_dir = TempDir::new().unwrap();
        let storage = create_domain_storage("finance", &config("file"), temp_dir.path()).unwrap();
        storage.store(DomainRecord::new(json!({"a": 1}))).await.unwrap();

        assert!(temp_dir.path().join("finance.yaml").exists());
    }

    #[test]
    fn unknown_backend_fails() {
        let result = create_domain_storage("finance", &config("cassandra"), Path::new("."));
        assert!(matches!(result, Err(RegistryError::UnsupportedStorageType(_))));
    }
}
