//! Domain Storage Port - Record storage for domain plugins.
//!
//! Each domain may persist its own records through a backend chosen in its
//! storage configuration. Records carry an open JSON payload plus the
//! user/conversation they belong to, which is what queries filter on.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, NaiveTime, Timelike, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

use crate::domain::foundation::{ConversationId, RecordId, Timestamp, UserId};

/// Errors that can occur during domain storage operations
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DomainStorageError {
    #[error("Operation not supported by this backend: {0}")]
    Unsupported(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Failed to serialize record: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    Io(String),
}

/// One stored domain record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainRecord {
    pub id: RecordId,
    pub user_id: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub data: Value,
    pub created_at: Timestamp,
}

impl DomainRecord {
    pub fn new(data: Value) -> Self {
        Self {
            id: RecordId::new(),
            user_id: None,
            conversation_id: None,
            data,
            created_at: Timestamp::now(),
        }
    }

    pub fn with_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn with_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn created_at(mut self, created_at: Timestamp) -> Self {
        self.created_at = created_at;
        self
    }

    /// Top-level payload field, if the payload is an object.
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.data.as_object().and_then(|o| o.get(name))
    }

    /// Copy keeping only the named payload fields.
    pub fn project(&self, fields: &[String]) -> Self {
        let data = match self.data.as_object() {
            Some(object) => Value::Object(
                object
                    .iter()
                    .filter(|(k, _)| fields.contains(k))
                    .map(|(k, v)| (k.clone(), v.clone()))
                    .collect(),
            ),
            None => self.data.clone(),
        };
        Self {
            data,
            ..self.clone()
        }
    }
}

/// Filters for querying domain records.
///
/// `from` is inclusive and `to` exclusive. Results are ordered oldest first
/// before `offset` and `limit` apply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryFilters {
    pub user_id: Option<UserId>,
    pub conversation_id: Option<ConversationId>,
    pub from: Option<Timestamp>,
    pub to: Option<Timestamp>,
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: usize,
    /// Payload fields to keep; all fields when `None`.
    pub fields: Option<Vec<String>>,
}

impl QueryFilters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(mut self, user_id: UserId) -> Self {
        self.user_id = Some(user_id);
        self
    }

    pub fn for_conversation(mut self, conversation_id: ConversationId) -> Self {
        self.conversation_id = Some(conversation_id);
        self
    }

    pub fn between(mut self, from: Timestamp, to: Timestamp) -> Self {
        self.from = Some(from);
        self.to = Some(to);
        self
    }

    pub fn paginate(mut self, offset: usize, limit: usize) -> Self {
        self.offset = offset;
        self.limit = Some(limit);
        self
    }

    pub fn with_fields(mut self, fields: Vec<String>) -> Self {
        self.fields = Some(fields);
        self
    }

    /// Same filters without pagination or projection.
    pub fn unpaged(&self) -> Self {
        Self {
            limit: None,
            offset: 0,
            fields: None,
            ..self.clone()
        }
    }

    /// True when the record passes the user, conversation and time filters.
    pub fn matches(&self, record: &DomainRecord) -> bool {
        if let Some(user_id) = &self.user_id {
            if record.user_id.as_ref() != Some(user_id) {
                return false;
            }
        }
        if let Some(conversation_id) = self.conversation_id {
            if record.conversation_id != Some(conversation_id) {
                return false;
            }
        }
        if let Some(from) = &self.from {
            if record.created_at.is_before(from) {
                return false;
            }
        }
        if let Some(to) = &self.to {
            if !record.created_at.is_before(to) {
                return false;
            }
        }
        true
    }
}

/// Aggregation over a numeric payload field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricOp {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl MetricOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Count => "count",
            Self::Sum => "sum",
            Self::Avg => "avg",
            Self::Min => "min",
            Self::Max => "max",
        }
    }
}

/// One metric to compute per bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub field: String,
    pub op: MetricOp,
}

impl Metric {
    pub fn new(field: impl Into<String>, op: MetricOp) -> Self {
        Self {
            field: field.into(),
            op,
        }
    }

    pub fn count() -> Self {
        Self::new("*", MetricOp::Count)
    }

    /// Key of this metric in a bucket, e.g. `sum_amount` or `count`.
    pub fn label(&self) -> String {
        match self.op {
            MetricOp::Count if self.field == "*" => "count".to_string(),
            op => format!("{}_{}", op.as_str(), self.field),
        }
    }
}

/// Time bucket width for aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Interval {
    Hour,
    Day,
    Week,
    Month,
}

impl Interval {
    /// Start of the bucket containing `ts`. Weeks start on Monday.
    pub fn truncate(&self, ts: Timestamp) -> Timestamp {
        let dt = ts.as_datetime();
        let date = dt.date_naive();
        let start = match self {
            Self::Hour => date.and_hms_opt(dt.hour(), 0, 0).unwrap_or_else(|| date.and_time(NaiveTime::MIN)),
            Self::Day => date.and_time(NaiveTime::MIN),
            Self::Week => {
                let back = i64::from(date.weekday().num_days_from_monday());
                (date - chrono::Duration::days(back)).and_time(NaiveTime::MIN)
            }
            Self::Month => NaiveDate::from_ymd_opt(date.year(), date.month(), 1)
                .unwrap_or(date)
                .and_time(NaiveTime::MIN),
        };
        Timestamp::from_datetime(Utc.from_utc_datetime(&start))
    }
}

/// What to aggregate.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateConfig {
    #[serde(default)]
    pub filters: QueryFilters,
    /// Payload field to group by.
    pub group_by: Option<String>,
    pub metrics: Vec<Metric>,
    pub interval: Option<Interval>,
}

/// One aggregation bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateBucket {
    /// Group value, when grouping by a field. Records missing it group under `null`.
    pub group: Option<Value>,
    /// Bucket start, when aggregating by interval.
    pub period_start: Option<Timestamp>,
    /// Metric label -> value. Metrics with no numeric input are omitted.
    pub values: BTreeMap<String, f64>,
}

/// Port for domain record storage
#[async_trait]
pub trait DomainStorage: Send + Sync {
    /// Store a record, returning its id
    async fn store(&self, record: DomainRecord) -> Result<RecordId, DomainStorageError>;

    /// Records matching the filters, oldest first
    async fn query(&self, filters: &QueryFilters) -> Result<Vec<DomainRecord>, DomainStorageError>;

    /// Aggregate matching records into buckets
    async fn aggregate(
        &self,
        config: &AggregateConfig,
    ) -> Result<Vec<AggregateBucket>, DomainStorageError>;

    /// Delete one record. Returns false if it did not exist.
    async fn delete(&self, id: RecordId) -> Result<bool, DomainStorageError>;

    /// Delete every matching record
    async fn delete_many(&self, _filters: &QueryFilters) -> Result<usize, DomainStorageError> {
        Err(DomainStorageError::Unsupported("delete_many".to_string()))
    }

    /// Number of matching records, ignoring pagination
    async fn count(&self, filters: &QueryFilters) -> Result<usize, DomainStorageError> {
        Ok(self.query(&filters.unpaged()).await?.len())
    }
}
