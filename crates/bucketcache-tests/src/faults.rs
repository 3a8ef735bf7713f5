//! Object store wrapper that fails on demand.

use async_trait::async_trait;
use bucketcache::MemoryObjectStore;
use bucketcache_core::{ObjectPage, ObjectStore, PutObject, StoreError, StoreResult, StoredObject};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Store call that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Put,
    Get,
    Delete,
    DeleteBatch,
    List,
    HeadBucket,
}

/// [`MemoryObjectStore`] with injectable failures.
#[derive(Debug, Default)]
pub struct FaultyStore {
    inner: MemoryObjectStore,
    faults: Mutex<HashMap<Operation, StoreError>>,
    failing_batches: Mutex<HashMap<usize, StoreError>>,
    batch_calls: AtomicUsize,
    completed_batches: Mutex<HashSet<usize>>,
}

impl FaultyStore {
    pub fn new(inner: MemoryObjectStore) -> Self {
        Self {
            inner,
            ..Default::default()
        }
    }

    pub fn inner(&self) -> &MemoryObjectStore {
        &self.inner
    }

    /// Fail every call of `operation` with `error`.
    pub fn fail(&self, operation: Operation, error: StoreError) {
        self.faults
            .lock()
            .expect("faults lock")
            .insert(operation, error);
    }

    /// Stop failing `operation`.
    pub fn heal(&self, operation: Operation) {
        self.faults.lock().expect("faults lock").remove(&operation);
    }

    /// Fail only the `index`-th (0-based) batch delete call.
    pub fn fail_batch(&self, index: usize, error: StoreError) {
        self.failing_batches
            .lock()
            .expect("batches lock")
            .insert(index, error);
    }

    /// Batch delete calls that went through.
    pub fn completed_batches(&self) -> HashSet<usize> {
        self.completed_batches.lock().expect("batches lock").clone()
    }

    fn check(&self, operation: Operation) -> StoreResult<()> {
        match self.faults.lock().expect("faults lock").get(&operation) {
            Some(error) => Err(error.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl ObjectStore for FaultyStore {
    async fn put_object(&self, request: PutObject) -> StoreResult<()> {
        self.check(Operation::Put)?;
        self.inner.put_object(request).await
    }

    async fn get_object(&self, key: &str) -> StoreResult<StoredObject> {
        self.check(Operation::Get)?;
        self.inner.get_object(key).await
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.check(Operation::Delete)?;
        self.inner.delete_object(key).await
    }

    async fn delete_objects(&self, keys: Vec<String>) -> StoreResult<()> {
        let index = self.batch_calls.fetch_add(1, Ordering::SeqCst);
        self.check(Operation::DeleteBatch)?;
        let failure = self
            .failing_batches
            .lock()
            .expect("batches lock")
            .get(&index)
            .cloned();
        if let Some(error) = failure {
            return Err(error);
        }

        self.inner.delete_objects(keys).await?;
        self.completed_batches
            .lock()
            .expect("batches lock")
            .insert(index);
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage> {
        self.check(Operation::List)?;
        self.inner
            .list_objects(prefix, max_keys, continuation_token)
            .await
    }

    async fn head_bucket(&self) -> StoreResult<()> {
        self.check(Operation::HeadBucket)?;
        self.inner.head_bucket().await
    }

    fn bucket(&self) -> &str {
        self.inner.bucket()
    }

    fn region(&self) -> &str {
        self.inner.region()
    }

    fn sdk_version(&self) -> &str {
        self.inner.sdk_version()
    }
}
