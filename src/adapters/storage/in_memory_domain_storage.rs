//! In-Memory Domain Storage Adapter
//!
//! Holds domain records in memory and evaluates queries and aggregations
//! directly over them. The evaluation helpers are shared with the file
//! backend.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{RecordId, Timestamp};
use crate::ports::{
    AggregateBucket, AggregateConfig, DomainRecord, DomainStorage, DomainStorageError, MetricOp,
    QueryFilters,
};

/// In-memory record storage for one domain collection
#[derive(Debug, Clone, Default)]
pub struct InMemoryDomainStorage {
    records: Arc<RwLock<Vec<DomainRecord>>>,
}

impl InMemoryDomainStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DomainStorage for InMemoryDomainStorage {
    async fn store(&self, record: DomainRecord) -> Result<RecordId, DomainStorageError> {
        validate_record(&record)?;
        let id = record.id;
        self.records.write().await.push(record);
        Ok(id)
    }

    async fn query(&self, filters: &QueryFilters) -> Result<Vec<DomainRecord>, DomainStorageError> {
        Ok(run_query(&self.records.read().await, filters))
    }

    async fn aggregate(
        &self,
        config: &AggregateConfig,
    ) -> Result<Vec<AggregateBucket>, DomainStorageError> {
        Ok(run_aggregate(&self.records.read().await, config))
    }

    async fn delete(&self, id: RecordId) -> Result<bool, DomainStorageError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| r.id != id);
        Ok(records.len() != before)
    }

    async fn delete_many(&self, filters: &QueryFilters) -> Result<usize, DomainStorageError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|r| !filters.matches(r));
        Ok(before - records.len())
    }
}

/// Records must carry an object payload so fields can be queried.
pub(crate) fn validate_record(record: &DomainRecord) -> Result<(), DomainStorageError> {
    if record.data.is_object() {
        Ok(())
    } else {
        Err(DomainStorageError::InvalidRecord(format!(
            "record {} payload must be a JSON object",
            record.id
        )))
    }
}

/// Matching records, oldest first, paginated and projected.
pub(crate) fn run_query(records: &[DomainRecord], filters: &QueryFilters) -> Vec<DomainRecord> {
    let mut matched: Vec<&DomainRecord> = records.iter().filter(|r| filters.matches(r)).collect();
    matched.sort_by(|a, b| a.created_at.cmp(&b.created_at));

    matched
        .into_iter()
        .skip(filters.offset)
        .take(filters.limit.unwrap_or(usize::MAX))
        .map(|r| match &filters.fields {
            Some(fields) => r.project(fields),
            None => r.clone(),
        })
        .collect()
}

/// Bucket matching records by interval and group, then compute metrics.
///
/// Buckets are ordered by period start, then by group value.
pub(crate) fn run_aggregate(records: &[DomainRecord], config: &AggregateConfig) -> Vec<AggregateBucket> {
    type BucketKey = (Option<Timestamp>, String);
    let mut buckets: BTreeMap<BucketKey, (Option<Value>, Vec<&DomainRecord>)> = BTreeMap::new();

    for record in records.iter().filter(|r| config.filters.matches(r)) {
        let period = config.interval.map(|i| i.truncate(record.created_at));
        let group = config
            .group_by
            .as_ref()
            .map(|field| record.field(field).cloned().unwrap_or(Value::Null));
        let group_key = group.as_ref().map(Value::to_string).unwrap_or_default();

        buckets
            .entry((period, group_key))
            .or_insert_with(|| (group, Vec::new()))
            .1
            .push(record);
    }

    buckets
        .into_iter()
        .map(|((period_start, _), (group, members))| {
            let values = config
                .metrics
                .iter()
                .filter_map(|metric| {
                    compute_metric(&members, &metric.field, metric.op).map(|v| (metric.label(), v))
                })
                .collect();
            AggregateBucket {
                group,
                period_start,
                values,
            }
        })
        .collect()
}

fn compute_metric(records: &[&DomainRecord], field: &str, op: MetricOp) -> Option<f64> {
    if op == MetricOp::Count {
        let count = if field == "*" {
            records.len()
        } else {
            records
                .iter()
                .filter(|r| r.field(field).is_some_and(|v| !v.is_null()))
                .count()
        };
        return Some(count as f64);
    }

    let numbers: Vec<f64> = records
        .iter()
        .filter_map(|r| r.field(field).and_then(Value::as_f64))
        .collect();
    if numbers.is_empty() {
        return None;
    }

    Some(match op {
        MetricOp::Sum => numbers.iter().sum(),
        MetricOp::Avg => numbers.iter().sum::<f64>() / numbers.len() as f64,
        MetricOp::Min => numbers.iter().copied().fold(f64::INFINITY, f64::min),
        MetricOp::Max => numbers.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        MetricOp::Count => numbers.len() as f64,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::{ConversationId, UserId};
    use crate::ports::{Interval, Metric};
    use serde_json::json;

    fn at(rfc3339: &str) -> Timestamp {
        Timestamp::from_datetime(
            chrono::DateTime::parse_from_rfc3339(rfc3339)
                .unwrap()
                .with_timezone(&chrono::Utc),
        )
    }

    async fn seeded() -> InMemoryDomainStorage {
        let storage = InMemoryDomainStorage::new();
        let rows = [
            ("2024-03-01T09:00:00Z", "food", 12.0),
            ("2024-03-01T18:00:00Z", "rent", 800.0),
            ("2024-03-02T10:00:00Z", "food", 30.0),
        ];
        for (ts, category, amount) in rows {
            storage
                .store(
                    DomainRecord::new(json!({"category": category, "amount": amount}))
                        .with_user(UserId::new("alice").unwrap())
                        .created_at(at(ts)),
                )
                .await
                .unwrap();
        }
        storage
    }

    #[tokio::test]
    async fn store_rejects_non_object_payload() {
        let storage = InMemoryDomainStorage::new();
        let result = storage.store(DomainRecord::new(json!(42))).await;
        assert!(matches!(result, Err(DomainStorageError::InvalidRecord(_))));
    }

    #[tokio::test]
    async fn query_paginates_oldest_first_and_projects() {
        let storage = seeded().await;
        let filters = QueryFilters::new()
            .paginate(1, 1)
            .with_fields(vec!["amount".into()]);

        let records = storage.query(&filters).await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].data, json!({"amount": 800.0}));
    }

    #[tokio::test]
    async fn query_filters_by_conversation() {
        let storage = seeded().await;
        let conversation_id = ConversationId::new();
        storage
            .store(DomainRecord::new(json!({"amount": 1})).with_conversation(conversation_id))
            .await
            .unwrap();

        let records = storage
            .query(&QueryFilters::new().for_conversation(conversation_id))
            .await
            .unwrap();

        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn count_ignores_pagination() {
        let storage = seeded().await;
        let count = storage.count(&QueryFilters::new().paginate(0, 1)).await.unwrap();
        assert_eq!(count, 3);
    }

    #[tokio::test]
    async fn aggregate_groups_by_field() {
        let storage = seeded().await;
        let config = AggregateConfig {
            group_by: Some("category".into()),
            metrics: vec![
                Metric::count(),
                Metric::new("amount", MetricOp::Sum),
                Metric::new("amount", MetricOp::Max),
            ],
            ..AggregateConfig::default()
        };

        let buckets = storage.aggregate(&config).await.unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].group, Some(json!("food")));
        assert_eq!(buckets[0].values["count"], 2.0);
        assert_eq!(buckets[0].values["sum_amount"], 42.0);
        assert_eq!(buckets[0].values["max_amount"], 30.0);
        assert_eq!(buckets[1].group, Some(json!("rent")));
    }

    #[tokio::test]
    async fn aggregate_by_day_interval() {
        let storage = seeded().await;
        let config = AggregateConfig {
            metrics: vec![Metric::new("amount", MetricOp::Avg)],
            interval: Some(Interval::Day),
            ..AggregateConfig::default()
        };

        let buckets = storage.aggregate(&config).await.unwrap();

        assert_eq!(buckets.len(), 2);
        assert_eq!(buckets[0].period_start, Some(at("2024-03-01T00:00:00Z")));
        assert_eq!(buckets[0].values["avg_amount"], 406.0);
        assert_eq!(buckets[1].values["avg_amount"], 30.0);
    }

    #[tokio::test]
    async fn aggregate_omits_metrics_without_numeric_input() {
        let storage = seeded().await;
        let config = AggregateConfig {
            metrics: vec![Metric::new("category", MetricOp::Sum)],
            ..AggregateConfig::default()
        };

        let buckets = storage.aggregate(&config).await.unwrap();

        assert_eq!(buckets.len(), 1);
        assert!(buckets[0].values.is_empty());
    }

    #[tokio::test]
    async fn delete_and_delete_many() {
        let storage = seeded().await;
        let first = storage.query(&QueryFilters::new()).await.unwrap()[0].id;

        assert!(storage.delete(first).await.unwrap());
        assert!(!storage.delete(first).await.unwrap());

        let removed = storage
            .delete_many(&QueryFilters::new().for_user(UserId::new("alice").unwrap()))
            .await
            .unwrap();
        assert_eq!(removed, 2);
    }
}
