//! File-based Domain Storage Adapter
//!
//! Keeps one YAML document per domain collection at
//! `<base>/<collection>.yaml`. The collection is loaded on first use and
//! rewritten after every mutation.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

use crate::domain::foundation::RecordId;
use crate::ports::{
    AggregateBucket, AggregateConfig, DomainRecord, DomainStorage, DomainStorageError,
    QueryFilters,
};

use super::in_memory_domain_storage::{run_aggregate, run_query, validate_record};

/// YAML-file record storage for one domain collection
#[derive(Debug)]
pub struct FileDomainStorage {
    path: PathBuf,
    records: Mutex<Option<Vec<DomainRecord>>>,
}

impl FileDomainStorage {
    pub fn new<P: AsRef<Path>>(base_path: P, collection: &str) -> Self {
        Self {
            path: base_path.as_ref().join(format!("{collection}.yaml")),
            records: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<DomainRecord>, DomainStorageError> {
        let exists = fs::try_exists(&self.path)
            .await
            .map_err(|e| DomainStorageError::Io(e.to_string()))?;
        if !exists {
            return Ok(Vec::new());
        }
        let yaml = fs::read_to_string(&self.path)
            .await
            .map_err(|e| DomainStorageError::Io(e.to_string()))?;
        serde_yaml::from_str(&yaml).map_err(|e| DomainStorageError::Serialization(e.to_string()))
    }

    async fn persist(&self, records: &[DomainRecord]) -> Result<(), DomainStorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| DomainStorageError::Io(e.to_string()))?;
        }
        let yaml = serde_yaml::to_string(records)
            .map_err(|e| DomainStorageError::Serialization(e.to_string()))?;
        let tmp_path = self.path.with_extension("yaml.tmp");
        fs::write(&tmp_path, yaml)
            .await
            .map_err(|e| DomainStorageError::Io(e.to_string()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| DomainStorageError::Io(e.to_string()))
    }

    /// Run `f` over the loaded collection, persisting when it reports a change.
    async fn with_records<T>(
        &self,
        f: impl FnOnce(&mut Vec<DomainRecord>) -> (T, bool),
    ) -> Result<T, DomainStorageError> {
        let mut guard = self.records.lock().await;
        if guard.is_none() {
            *guard = Some(self.load().await?);
        }
        let records = guard.get_or_insert_with(Vec::new);
        let (result, changed) = f(records);
        if changed {
            self.persist(records).await?;
        }
        Ok(result)
    }
}

#[async_trait]
impl DomainStorage for FileDomainStorage {
    async fn store(&self, record: DomainRecord) -> Result<RecordId, DomainStorageError> {
        validate_record(&record)?;
        let id = record.id;
        self.with_records(|records| {
            records.push(record);
            (id, true)
        })
        .await
    }

    async fn query(&self, filters: &QueryFilters) -> Result<Vec<DomainRecord>, DomainStorageError> {
        self.with_records(|records| (run_query(records, filters), false))
            .await
    }

    async fn aggregate(
        &self,
        config: &AggregateConfig,
    ) -> Result<Vec<AggregateBucket>, DomainStorageError> {
        self.with_records(|records| (run_aggregate(records, config), false))
            .await
    }

    async fn delete(&self, id: RecordId) -> Result<bool, DomainStorageError> {
        self.with_records(|records| {
            let before = records.len();
            records.retain(|r| r.id != id);
            let removed = records.len() != before;
            (removed, removed)
        })
        .await
    }

    async fn delete_many(&self, filters: &QueryFilters) -> Result<usize, DomainStorageError> {
        self.with_records(|records| {
            let before = records.len();
            records.retain(|r| !filters.matches(r));
            let removed = before - records.len();
            (removed, removed > 0)
        })
        .await
    }
}
