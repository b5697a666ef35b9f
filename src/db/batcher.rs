use serde::Serialize;
use tracing::{debug, error, info, warn};

use super::{DocumentStore, WriteOp};

/// Operation ceiling per atomic batch; one below the backend's limit of 500
pub const MAX_OPS_PER_BATCH: usize = 499;

/// A chunk that failed to commit
#[derive(Debug, Clone, Serialize)]
pub struct ChunkFailure {
    /// Zero-based position of the chunk within the run
    pub index: usize,
    /// Paths of every record the chunk carried
    pub paths: Vec<String>,
    pub error: String,
}

/// Per-run summary of chunk commits
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchReport {
    pub chunks_attempted: usize,
    pub chunks_committed: usize,
    pub chunks_failed: usize,
    pub ops_committed: usize,
    pub ops_failed: usize,
    pub failures: Vec<ChunkFailure>,
}

impl BatchReport {
    pub fn is_clean(&self) -> bool {
        self.chunks_failed == 0
    }
}

/// Accumulates write operations and commits them in bounded chunks.
///
/// Each chunk commits atomically. A failed chunk is logged and counted, and
/// the batcher carries on with a fresh chunk: a bulk run is best effort, with
/// no transaction spanning chunks.
pub struct RecordBatcher<'a> {
    store: &'a dyn DocumentStore,
    max_ops: usize,
    open: Vec<WriteOp>,
    report: BatchReport,
}

impl<'a> RecordBatcher<'a> {
    pub fn new(store: &'a dyn DocumentStore) -> Self {
        Self::with_limit(store, MAX_OPS_PER_BATCH)
    }

    /// Batcher with a lower ceiling, clamped to `1..=MAX_OPS_PER_BATCH`
    pub fn with_limit(store: &'a dyn DocumentStore, max_ops: usize) -> Self {
        let max_ops = max_ops.clamp(1, MAX_OPS_PER_BATCH);
        Self {
            store,
            max_ops,
            open: Vec::with_capacity(max_ops),
            report: BatchReport::default(),
        }
    }

    pub fn pending(&self) -> usize {
        self.open.len()
    }

    /// Append an operation to the open batch
    pub fn enqueue(&mut self, op: WriteOp) {
        self.open.push(op);
    }

    /// Commit full chunks until the open batch is below the ceiling
    pub async fn flush_if_full(&mut self) {
        while self.open.len() >= self.max_ops {
            let chunk: Vec<WriteOp> = self.open.drain(..self.max_ops).collect();
            self.commit_chunk(chunk).await;
        }
    }

    pub async fn push(&mut self, op: WriteOp) {
        self.enqueue(op);
        self.flush_if_full().await;
    }

    /// Enqueue operations that must land in the same chunk.
    ///
    /// When the group does not fit beside what is already open, the open
    /// batch is committed first. A group larger than the ceiling is never
    /// split: it is committed on its own as one oversized chunk.
    pub async fn push_group(&mut self, ops: Vec<WriteOp>) {
        if ops.is_empty() {
            return;
        }
        if !self.open.is_empty() && self.open.len() + ops.len() > self.max_ops {
            let chunk = std::mem::take(&mut self.open);
            self.commit_chunk(chunk).await;
        }
        if ops.len() > self.max_ops {
            warn!(
                "Group of {} operations exceeds the ceiling of {}, committing it as one chunk",
                ops.len(),
                self.max_ops
            );
            self.commit_chunk(ops).await;
            return;
        }
        self.open.extend(ops);
        self.flush_if_full().await;
    }

    /// Commit whatever is left and hand back the run report
    pub async fn finalize(mut self) -> BatchReport {
        while !self.open.is_empty() {
            let take = self.open.len().min(self.max_ops);
            let chunk: Vec<WriteOp> = self.open.drain(..take).collect();
            self.commit_chunk(chunk).await;
        }

        info!(
            "Batch run finished: {}/{} chunks committed, {} failed, {} operations written",
            self.report.chunks_committed,
            self.report.chunks_attempted,
            self.report.chunks_failed,
            self.report.ops_committed
        );
        self.report
    }

    async fn commit_chunk(&mut self, chunk: Vec<WriteOp>) {
        if chunk.is_empty() {
            return;
        }

        let index = self.report.chunks_attempted;
        self.report.chunks_attempted += 1;

        match self.store.commit(&chunk).await {
            Ok(()) => {
                self.report.chunks_committed += 1;
                self.report.ops_committed += chunk.len();
                debug!("Committed chunk {} with {} operations", index, chunk.len());
            }
            Err(e) => {
                let paths: Vec<String> = chunk.iter().map(|op| op.path.to_string()).collect();
                error!(
                    chunk = index,
                    records = ?paths,
                    "Failed to commit chunk of {} operations: {}",
                    chunk.len(),
                    e
                );
                self.report.chunks_failed += 1;
                self.report.ops_failed += chunk.len();
                self.report.failures.push(ChunkFailure {
                    index,
                    paths,
                    error: e.to_string(),
                });
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::db::memory::MemoryStore;
    use crate::db::{DocPath, Document, StoreError};
    use async_trait::async_trait;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    /// Wraps a memory store, records chunk sizes and fails chosen commits
    pub(crate) struct FlakyStore {
        pub inner: MemoryStore,
        pub fail_on: Vec<usize>,
        pub commits: Mutex<Vec<usize>>,
    }

    impl FlakyStore {
        pub fn failing(fail_on: Vec<usize>) -> Self {
            Self {
                inner: MemoryStore::new(),
                fail_on,
                commits: Mutex::new(Vec::new()),
            }
        }

        pub fn chunk_sizes(&self) -> Vec<usize> {
            self.commits.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn get(&self, path: &DocPath) -> Result<Option<Value>, StoreError> {
            self.inner.get(path).await
        }

        async fn list(&self, collection: &str) -> Result<Vec<Document>, StoreError> {
            self.inner.list(collection).await
        }

        async fn delete(&self, path: &DocPath) -> Result<bool, StoreError> {
            self.inner.delete(path).await
        }

        async fn commit(&self, ops: &[WriteOp]) -> Result<(), StoreError> {
            let attempt = {
                let mut commits = self.commits.lock().unwrap();
                commits.push(ops.len());
                commits.len() - 1
            };
            if self.fail_on.contains(&attempt) {
                return Err(StoreError::Rejected(format!("injected failure {}", attempt)));
            }
            self.inner.commit(ops).await
        }

        async fn ping(&self) -> Result<(), StoreError> {
            Ok(())
        }
    }

    fn op(n: usize) -> WriteOp {
        let mut data = Map::new();
        data.insert("n".to_string(), json!(n));
        WriteOp::merge(DocPath::new("items", &n.to_string()), data)
    }

    #[tokio::test]
    async fn thousand_operations_commit_in_three_chunks() {
        let store = FlakyStore::failing(vec![]);
        let mut batcher = RecordBatcher::new(&store);

        for n in 0..1000 {
            batcher.push(op(n)).await;
        }
        let report = batcher.finalize().await;

        assert_eq!(store.chunk_sizes(), vec![499, 499, 2]);
        assert_eq!(report.chunks_committed, 3);
        assert_eq!(report.ops_committed, 1000);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn failed_chunk_does_not_block_later_chunks() {
        let store = FlakyStore::failing(vec![1]);
        let mut batcher = RecordBatcher::new(&store);

        for n in 0..1000 {
            batcher.push(op(n)).await;
        }
        let report = batcher.finalize().await;

        assert_eq!(report.chunks_attempted, 3);
        assert_eq!(report.chunks_failed, 1);
        assert_eq!(report.ops_failed, 499);
        assert_eq!(report.failures[0].index, 1);
        assert_eq!(report.failures[0].paths.len(), 499);
        assert_eq!(report.failures[0].paths[0], "items/499");

        assert!(store.get(&DocPath::new("items", "0")).await.unwrap().is_some());
        assert!(store.get(&DocPath::new("items", "600")).await.unwrap().is_none());
        assert!(store.get(&DocPath::new("items", "999")).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn empty_batch_is_never_committed() {
        let store = FlakyStore::failing(vec![]);
        let batcher = RecordBatcher::new(&store);

        let report = batcher.finalize().await;

        assert!(store.chunk_sizes().is_empty());
        assert_eq!(report.chunks_attempted, 0);
    }

    #[tokio::test]
    async fn enqueue_alone_waits_for_flush() {
        let store = FlakyStore::failing(vec![]);
        let mut batcher = RecordBatcher::with_limit(&store, 3);

        for n in 0..7 {
            batcher.enqueue(op(n));
        }
        assert_eq!(batcher.pending(), 7);
        assert!(store.chunk_sizes().is_empty());

        batcher.flush_if_full().await;
        assert_eq!(batcher.pending(), 1);

        batcher.finalize().await;
        assert_eq!(store.chunk_sizes(), vec![3, 3, 1]);
    }

    #[tokio::test]
    async fn group_is_kept_in_one_chunk() {
        let store = FlakyStore::failing(vec![]);
        let mut batcher = RecordBatcher::with_limit(&store, 4);

        for n in 0..3 {
            batcher.push(op(n)).await;
        }
        batcher.push_group(vec![op(10), op(11)]).await;
        batcher.finalize().await;

        assert_eq!(store.chunk_sizes(), vec![3, 2]);
    }

    #[tokio::test]
    async fn oversized_group_commits_whole() {
        let store = FlakyStore::failing(vec![]);
        let mut batcher = RecordBatcher::with_limit(&store, 2);

        batcher.push(op(0)).await;
        batcher.push_group((10..15).map(op).collect()).await;
        batcher.push(op(1)).await;
        let report = batcher.finalize().await;

        assert_eq!(store.chunk_sizes(), vec![1, 5, 1]);
        assert_eq!(report.ops_committed, 7);
    }

    #[tokio::test]
    async fn limit_is_clamped_to_backend_ceiling() {
        let store = FlakyStore::failing(vec![]);
        let mut batcher = RecordBatcher::with_limit(&store, 10_000);

        for n in 0..500 {
            batcher.push(op(n)).await;
        }
        batcher.finalize().await;

        assert_eq!(store.chunk_sizes(), vec![499, 1]);
    }
}
