//! Port traits (hexagonal architecture).
//!
//! `ObjectStore` is the boundary to the storage provider; `CacheStore` is
//! the pluggable cache interface applications program against.

use crate::error::{Result, StoreResult};
use crate::types::{HealthReport, ObjectPage, PutObject, ScanResult, StoredObject};
use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Object storage primitives used by the cache engine.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (or fully overwrite) an object.
    async fn put_object(&self, request: PutObject) -> StoreResult<()>;

    /// Read an object. Missing objects fail with `StoreError::NotFound`.
    async fn get_object(&self, key: &str) -> StoreResult<StoredObject>;

    /// Delete a single object.
    async fn delete_object(&self, key: &str) -> StoreResult<()>;

    /// Delete up to `MAX_KEYS_PER_DELETE` objects in one call.
    async fn delete_objects(&self, keys: Vec<String>) -> StoreResult<()>;

    /// List keys under a prefix, one page at a time.
    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage>;

    /// Check that the bucket exists and is reachable.
    async fn head_bucket(&self) -> StoreResult<()>;

    fn bucket(&self) -> &str;

    fn region(&self) -> &str;

    /// Version of the underlying storage SDK, for diagnostics.
    fn sdk_version(&self) -> &str;
}

/// Generic key-value cache interface.
#[async_trait]
pub trait CacheStore<V>: Send + Sync
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Get a live value; misses and expired entries yield `None`.
    async fn get(&self, key: &str) -> Result<Option<V>>;

    /// Store a value. `None` is the unstorable "no value" and is rejected.
    async fn set(&self, key: &str, value: Option<V>, ttl: Option<i64>) -> Result<V>;

    /// Delete a value. Deleting a missing key succeeds.
    async fn del(&self, key: &str) -> Result<()>;

    /// Remove every entry in the cache namespace.
    async fn clear(&self) -> Result<()>;

    /// List live entries whose key starts with `pattern`.
    async fn scan(&self, pattern: Option<&str>, limit: Option<usize>) -> Result<ScanResult<V>>;

    /// Probe the backend. Never fails; inspect the report status.
    async fn health_check(&self) -> HealthReport;
}
