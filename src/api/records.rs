use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;
use uuid::Uuid;

use crate::db::{DocPath, DocumentStore, StoreError};
use crate::error::ServiceError;
use crate::matching::ledger::WorkerSwipes;
use crate::models::{Job, User};

/// Raw document plus its typed form
pub struct Loaded<T> {
    pub raw: Value,
    pub record: T,
}

pub async fn fetch<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    path: &DocPath,
) -> Result<Option<Loaded<T>>, ServiceError> {
    let Some(raw) = store.get(path).await? else {
        return Ok(None);
    };
    let record = serde_json::from_value(raw.clone()).map_err(StoreError::from)?;
    Ok(Some(Loaded { raw, record }))
}

pub async fn fetch_user(store: &dyn DocumentStore, id: Uuid) -> Result<Option<User>, ServiceError> {
    Ok(fetch::<User>(store, &DocPath::user(id)).await?.map(|l| l.record))
}

pub async fn fetch_job(store: &dyn DocumentStore, id: Uuid) -> Result<Option<Job>, ServiceError> {
    Ok(fetch::<Job>(store, &DocPath::job(id)).await?.map(|l| l.record))
}

pub async fn fetch_swipes(store: &dyn DocumentStore, worker: Uuid) -> Result<Option<WorkerSwipes>, ServiceError> {
    Ok(fetch::<WorkerSwipes>(store, &DocPath::swipes(worker)).await?.map(|l| l.record))
}

/// Every readable record of a collection; unreadable documents are logged and skipped
pub async fn list<T: DeserializeOwned>(store: &dyn DocumentStore, collection: &str) -> Result<Vec<T>, ServiceError> {
    let mut records = Vec::new();
    for doc in store.list(collection).await? {
        match serde_json::from_value(doc.data) {
            Ok(record) => records.push(record),
            Err(e) => warn!("Skipping unreadable document {}/{}: {}", collection, doc.id, e),
        }
    }
    Ok(records)
}
