//! In-memory object store for local development and tests.

use async_trait::async_trait;
use bucketcache_core::{
    MAX_KEYS_PER_DELETE, MAX_KEYS_PER_PAGE, ObjectPage, ObjectStore, PutObject, StoreError,
    StoreResult, StoredObject,
};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::RwLock;

/// Number of calls made against a [`MemoryObjectStore`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperationCounts {
    pub puts: u64,
    pub gets: u64,
    pub deletes: u64,
    pub batch_deletes: u64,
    pub lists: u64,
}

/// Object store kept in a sorted map, listing keys in lexicographic order like S3.
#[derive(Debug)]
pub struct MemoryObjectStore {
    bucket: String,
    region: String,
    objects: RwLock<BTreeMap<String, StoredObject>>,
    puts: AtomicU64,
    gets: AtomicU64,
    deletes: AtomicU64,
    batch_deletes: AtomicU64,
    lists: AtomicU64,
}

impl MemoryObjectStore {
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: "local".to_string(),
            objects: RwLock::new(BTreeMap::new()),
            puts: AtomicU64::new(0),
            gets: AtomicU64::new(0),
            deletes: AtomicU64::new(0),
            batch_deletes: AtomicU64::new(0),
            lists: AtomicU64::new(0),
        }
    }

    /// Number of stored objects.
    pub async fn len(&self) -> usize {
        self.objects.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.objects.read().await.is_empty()
    }

    /// Stored keys in listing order.
    pub async fn keys(&self) -> Vec<String> {
        self.objects.read().await.keys().cloned().collect()
    }

    /// Raw object, bypassing call counters.
    pub async fn object(&self, key: &str) -> Option<StoredObject> {
        self.objects.read().await.get(key).cloned()
    }

    /// Insert a raw object, bypassing call counters.
    pub async fn insert(&self, key: impl Into<String>, object: StoredObject) {
        self.objects.write().await.insert(key.into(), object);
    }

    pub fn operation_counts(&self) -> OperationCounts {
        OperationCounts {
            puts: self.puts.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            batch_deletes: self.batch_deletes.load(Ordering::Relaxed),
            lists: self.lists.load(Ordering::Relaxed),
        }
    }
}

impl Default for MemoryObjectStore {
    fn default() -> Self {
        Self::new("memory")
    }
}

#[async_trait]
impl ObjectStore for MemoryObjectStore {
    async fn put_object(&self, request: PutObject) -> StoreResult<()> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        let object = StoredObject {
            body: request.body,
            metadata: request.metadata,
            content_type: Some(request.content_type),
            storage_class: request.storage_class,
            server_side_encryption: request.server_side_encryption,
        };
        self.objects.write().await.insert(request.key, object);
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<StoredObject> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.objects
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key))
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.objects.write().await.remove(key);
        Ok(())
    }

    async fn delete_objects(&self, keys: Vec<String>) -> StoreResult<()> {
        self.batch_deletes.fetch_add(1, Ordering::Relaxed);
        if keys.len() > MAX_KEYS_PER_DELETE {
            return Err(StoreError::Service {
                code: Some("MalformedXML".to_string()),
                status: Some(400),
                message: format!(
                    "Batch of {} keys exceeds the limit of {}",
                    keys.len(),
                    MAX_KEYS_PER_DELETE
                ),
            });
        }

        let mut objects = self.objects.write().await;
        for key in keys {
            objects.remove(&key);
        }
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage> {
        self.lists.fetch_add(1, Ordering::Relaxed);
        let max_keys = max_keys.min(MAX_KEYS_PER_PAGE);
        let objects = self.objects.read().await;

        // The continuation token is the last key of the previous page.
        let start = match &continuation_token {
            Some(after) => Bound::Excluded(after.clone()),
            None => Bound::Included(prefix.to_string()),
        };

        let mut matching = objects
            .range((start, Bound::Unbounded))
            .map(|(key, _)| key)
            .skip_while(|key| !key.starts_with(prefix))
            .take_while(|key| key.starts_with(prefix));

        let keys: Vec<String> = matching.by_ref().take(max_keys).cloned().collect();
        let is_truncated = matching.next().is_some();
        let next_continuation_token = if is_truncated { keys.last().cloned() } else { None };

        Ok(ObjectPage {
            keys,
            is_truncated,
            next_continuation_token,
        })
    }

    async fn head_bucket(&self) -> StoreResult<()> {
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn sdk_version(&self) -> &str {
        env!("CARGO_PKG_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    async fn seeded(keys: &[&str]) -> MemoryObjectStore {
        let store = MemoryObjectStore::default();
        for key in keys {
            store.insert(*key, StoredObject::default()).await;
        }
        store
    }

    #[tokio::test]
    async fn test_get_missing_is_not_found() {
        let store = MemoryObjectStore::default();
        assert!(store.get_object("nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_list_pagination() {
        let store = seeded(&["a/1", "a/2", "a/3", "b/1"]).await;

        let first = store.list_objects("a/", 2, None).await.unwrap();
        assert_eq!(first.keys, vec!["a/1", "a/2"]);
        assert!(first.is_truncated);

        let second = store
            .list_objects("a/", 2, first.next_continuation_token)
            .await
            .unwrap();
        assert_eq!(second.keys, vec!["a/3"]);
        assert!(!second.is_truncated);
        assert_eq!(second.next_continuation_token, None);
    }

    #[tokio::test]
    async fn test_list_exact_page_is_not_truncated() {
        let store = seeded(&["k1", "k2"]).await;
        let page = store.list_objects("k", 2, None).await.unwrap();
        assert_eq!(page.keys.len(), 2);
        assert!(!page.is_truncated);
    }

    #[tokio::test]
    async fn test_batch_delete_limit() {
        let store = MemoryObjectStore::default();
        let keys = (0..=MAX_KEYS_PER_DELETE).map(|i| i.to_string()).collect();
        let err = store.delete_objects(keys).await.unwrap_err();
        assert_eq!(err.status_code(), Some(400));
    }
}
