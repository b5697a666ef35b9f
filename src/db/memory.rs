use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::{Mutex, RwLock};

use super::models::Document;
use super::{apply_write, DocPath, DocumentStore, StoreError, WriteOp};

/// In-process document store used when no database is configured
#[derive(Default)]
pub struct MemoryStore {
    docs: RwLock<BTreeMap<DocPath, Value>>,
    last_stamp: Mutex<Option<DateTime<Utc>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wall clock, clamped so that stamps never go backwards between commits
    async fn server_now(&self) -> DateTime<Utc> {
        let mut last = self.last_stamp.lock().await;
        let now = match *last {
            Some(previous) if previous > Utc::now() => previous,
            _ => Utc::now(),
        };
        *last = Some(now);
        now
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
        Ok(self.docs.read().await.get(path).cloned())
    }

    async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
        let docs = self.docs.read().await;
        Ok(docs
            .iter()
            .filter(|(path, _)| path.collection() == collection)
            .map(|(path, data)| Document {
                id: path.id().to_string(),
                data: data.clone(),
            })
            .collect())
    }

    async fn delete(&self, path: &DocPath) -> Result<bool, StoreError> {
        Ok(self.docs.write().await.remove(path).is_some())
    }

    async fn commit(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
        let now = self.server_now().await;
        let mut docs = self.docs.write().await;

        // Stage against a scratch copy of the touched documents so the chunk
        // lands all at once.
        let mut staged: BTreeMap<DocPath, Value> = BTreeMap::new();
        for op in ops {
            let existing = staged
                .remove(&op.path)
                .or_else(|| docs.get(&op.path).cloned());
            staged.insert(op.path.clone(), apply_write(existing, op, now));
        }
        docs.extend(staged);
        Ok(())
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Map};
    use uuid::Uuid;

    fn merge(path: DocPath, value: Value) -> WriteOp {
        WriteOp::merge(path, value.as_object().cloned().unwrap_or_else(Map::new))
    }

    #[tokio::test]
    async fn commit_then_get_and_delete() {
        let store = MemoryStore::new();
        let path = DocPath::new("jobs", "j1");

        store
            .commit(&[WriteOp::set(path.clone(), &json!({"title": "Cook"})).unwrap()])
            .await
            .unwrap();

        assert_eq!(store.get(&path).await.unwrap(), Some(json!({"title": "Cook"})));
        assert!(store.delete(&path).await.unwrap());
        assert!(!store.delete(&path).await.unwrap());
        assert_eq!(store.get(&path).await.unwrap(), None);
    }

    #[tokio::test]
    async fn list_only_returns_direct_children() {
        let store = MemoryStore::new();
        let worker = Uuid::new_v4();

        store
            .commit(&[
                merge(DocPath::user(worker), json!({"role": "Worker"})),
                merge(DocPath::swipes(worker), json!({"liked_jobs": []})),
            ])
            .await
            .unwrap();

        let users = store.list("users").await.unwrap();
        assert_eq!(users.len(), 1);
        assert_eq!(users[0].id, worker.to_string());

        let swipes = store.list(&format!("users/{}/swipes", worker)).await.unwrap();
        assert_eq!(swipes.len(), 1);
        assert_eq!(swipes[0].id, "data");
    }

    #[tokio::test]
    async fn operations_on_the_same_path_apply_in_order() {
        let store = MemoryStore::new();
        let path = DocPath::new("users", "b1");

        store
            .commit(&[
                merge(path.clone(), json!({"disliked_workers": {"w1": true}})),
                merge(path.clone(), json!({"disliked_workers": {"w2": true}})),
            ])
            .await
            .unwrap();

        assert_eq!(
            store.get(&path).await.unwrap().unwrap(),
            json!({"disliked_workers": {"w1": true, "w2": true}})
        );
    }

    #[tokio::test]
    async fn server_timestamps_never_decrease() {
        let store = MemoryStore::new();
        let path = DocPath::new("users", "u");
        let stamp = |v: Value| -> DateTime<Utc> {
            v["last_updated_at"].as_str().unwrap().parse().unwrap()
        };

        let op = merge(path.clone(), json!({})).with_server_timestamp("last_updated_at");
        store.commit(&[op.clone()]).await.unwrap();
        let first = stamp(store.get(&path).await.unwrap().unwrap());
        store.commit(&[op]).await.unwrap();
        let second = stamp(store.get(&path).await.unwrap().unwrap());

        assert!(second >= first);
    }
}
