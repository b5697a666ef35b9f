pub mod batcher;
pub mod connection;
pub mod memory;
pub mod migrations;
pub mod models;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

pub use batcher::{BatchReport, RecordBatcher, MAX_OPS_PER_BATCH};
pub use models::Document;

pub const USERS: &str = "users";
pub const JOBS: &str = "jobs";

/// Errors raised by a document store backend
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Document {0} is not a JSON object")]
    NotAnObject(String),

    #[error("Commit rejected: {0}")]
    Rejected(String),
}

/// Slash-separated location of a document, e.g. `users/{id}/swipes/data`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DocPath(String);

impl DocPath {
    pub fn new(collection: &str, id: &str) -> Self {
        DocPath(format!("{}/{}", collection, id))
    }

    pub fn user(id: Uuid) -> Self {
        Self::new(USERS, &id.to_string())
    }

    pub fn job(id: Uuid) -> Self {
        Self::new(JOBS, &id.to_string())
    }

    /// Swipe ledger document of a worker
    pub fn swipes(worker_id: Uuid) -> Self {
        DocPath(format!("{}/{}/swipes/data", USERS, worker_id))
    }

    /// Everything before the last segment
    pub fn collection(&self) -> &str {
        self.0.rsplit_once('/').map(|(c, _)| c).unwrap_or("")
    }

    /// The last segment
    pub fn id(&self) -> &str {
        self.0.rsplit_once('/').map(|(_, id)| id).unwrap_or(&self.0)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteMode {
    /// Replace the whole document
    Set,
    /// Deep-merge into the existing document, creating it if absent
    Merge,
}

/// Field-level operations resolved by the store at commit time
#[derive(Debug, Clone, PartialEq)]
pub enum FieldTransform {
    /// Stamp the field with the store's clock
    ServerTimestamp(String),
    /// Append each value not already present in the array field
    ArrayUnion(String, Vec<Value>),
}

/// One operation inside a batched write
#[derive(Debug, Clone)]
pub struct WriteOp {
    pub path: DocPath,
    pub mode: WriteMode,
    pub data: Map<String, Value>,
    pub transforms: Vec<FieldTransform>,
}

impl WriteOp {
    /// Full create/replace of `path` from a serializable record
    pub fn set<T: Serialize>(path: DocPath, record: &T) -> Result<Self, StoreError> {
        match serde_json::to_value(record)? {
            Value::Object(data) => Ok(Self {
                path,
                mode: WriteMode::Set,
                data,
                transforms: Vec::new(),
            }),
            _ => Err(StoreError::NotAnObject(path.to_string())),
        }
    }

    pub fn merge(path: DocPath, data: Map<String, Value>) -> Self {
        Self {
            path,
            mode: WriteMode::Merge,
            data,
            transforms: Vec::new(),
        }
    }

    pub fn with_server_timestamp(mut self, field: &str) -> Self {
        self.data.remove(field);
        self.transforms
            .push(FieldTransform::ServerTimestamp(field.to_string()));
        self
    }

    pub fn with_array_union(mut self, field: &str, values: Vec<Value>) -> Self {
        self.transforms
            .push(FieldTransform::ArrayUnion(field.to_string(), values));
        self
    }
}

/// Recursively merge `patch` into `target`.
///
/// Objects merge key by key; any other value (arrays included) replaces.
pub fn merge_value(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_value(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (slot, value) => *slot = value,
    }
}

/// Compute the document that results from applying `op` on top of `existing`
pub fn apply_write(existing: Option<Value>, op: &WriteOp, now: DateTime<Utc>) -> Value {
    let mut doc = match (op.mode, existing) {
        (WriteMode::Merge, Some(current @ Value::Object(_))) => {
            let mut current = current;
            merge_value(&mut current, Value::Object(op.data.clone()));
            current
        }
        _ => Value::Object(op.data.clone()),
    };

    if let Value::Object(fields) = &mut doc {
        for transform in &op.transforms {
            match transform {
                FieldTransform::ServerTimestamp(field) => {
                    fields.insert(
                        field.clone(),
                        Value::String(now.to_rfc3339_opts(SecondsFormat::Micros, true)),
                    );
                }
                FieldTransform::ArrayUnion(field, values) => {
                    let slot = fields
                        .entry(field.clone())
                        .or_insert_with(|| Value::Array(Vec::new()));
                    if !slot.is_array() {
                        *slot = Value::Array(Vec::new());
                    }
                    if let Value::Array(items) = slot {
                        for value in values {
                            if !items.contains(value) {
                                items.push(value.clone());
                            }
                        }
                    }
                }
            }
        }
    }

    doc
}

/// Black-box document store with atomic batched writes.
///
/// `commit` is all-or-nothing for the operations it is handed and resolves
/// every [`FieldTransform`] against the store's own clock and contents.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError>;

    /// Documents directly inside `collection`, ordered by path
    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError>;

    /// Hard delete; returns whether a document existed
    async fn delete(&self, path: &DocPath) -> Result<bool, StoreError>;

    async fn commit(&self, ops: &[WriteOp]) -> Result<(), StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;

    async fn close(&self) {}
}

pub type SharedStore = Arc<dyn DocumentStore>;
