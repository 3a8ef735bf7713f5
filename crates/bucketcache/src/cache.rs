//! Cache engine over an [`ObjectStore`].

use crate::health;
use crate::keys::KeyCodec;
use crate::metrics::CacheMetrics;
use async_trait::async_trait;
use bucketcache_core::{
    CacheConfig, CacheError, CacheStore, Clock, EntryMetadata, HealthReport, JSON_CONTENT_TYPE,
    MAX_KEYS_PER_DELETE, MAX_KEYS_PER_PAGE, ObjectStore, PutObject, Result, ScanCursor, ScanEntry,
    ScanResult, SystemClock, Ttl, stored_expiry,
};
use futures::future::join_all;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Number of keys a scan lists when no limit is given.
pub const DEFAULT_SCAN_LIMIT: usize = 100;

/// Key-value cache whose entries are objects in a bucket.
///
/// Entries carry their expiry in object metadata. Expired entries are
/// reported as misses and removed in the background when read; there is
/// no sweeper, so unread expired entries stay until `clear`.
#[derive(Clone)]
pub struct ObjectCache {
    store: Arc<dyn ObjectStore>,
    codec: KeyCodec,
    default_ttl: Ttl,
    storage_class: Option<String>,
    server_side_encryption: Option<String>,
    clock: Arc<dyn Clock>,
    metrics: Arc<CacheMetrics>,
}

impl ObjectCache {
    /// Create a cache over an existing store.
    pub fn new(config: &CacheConfig, store: Arc<dyn ObjectStore>) -> Result<Self> {
        config.validate()?;

        info!(
            bucket = %store.bucket(),
            prefix = %config.prefix,
            default_ttl = config.default_ttl,
            "Object cache initialized"
        );

        Ok(Self {
            store,
            codec: KeyCodec::new(config.prefix.clone()),
            default_ttl: config.ttl()?,
            storage_class: config.storage_class.clone(),
            server_side_encryption: config.server_side_encryption.clone(),
            clock: Arc::new(SystemClock),
            metrics: CacheMetrics::new(),
        })
    }

    /// Connect to S3 (or a compatible endpoint) using the configuration.
    #[cfg(feature = "s3")]
    pub async fn connect(config: CacheConfig) -> Result<Self> {
        let store = bucketcache_s3::S3ObjectStore::connect(&config).await?;
        Self::new(&config, Arc::new(store))
    }

    /// Replace the clock used for TTL bookkeeping.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn metrics(&self) -> &Arc<CacheMetrics> {
        &self.metrics
    }

    pub fn codec(&self) -> &KeyCodec {
        &self.codec
    }

    pub fn store(&self) -> &Arc<dyn ObjectStore> {
        &self.store
    }

    /// Read a live value. Missing and expired entries yield `None`.
    ///
    /// An expired entry is deleted in the background. The cleanup re-reads
    /// the entry first and leaves it alone when a later `set` replaced it,
    /// but a `set` landing between that re-read and the delete is lost.
    pub async fn get<V: DeserializeOwned>(&self, key: &str) -> Result<Option<V>> {
        let storage_key = self.codec.encode(key)?;

        let object = match self.store.get_object(&storage_key).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                debug!(key = %key, "Cache miss");
                self.metrics.record_miss();
                return Ok(None);
            }
            Err(e) => {
                self.metrics.record_error();
                return Err(CacheError::s3("get", e));
            }
        };

        if self.is_expired(&storage_key, &object.metadata) {
            debug!(key = %key, "Cache entry expired");
            self.metrics.record_expired();
            self.spawn_expired_delete(storage_key);
            return Ok(None);
        }

        let value = serde_json::from_slice(&object.body).map_err(|e| {
            self.metrics.record_error();
            CacheError::Serialization {
                message: format!("Failed to deserialize value for key {:?}: {}", key, e),
                source: Some(e),
            }
        })?;

        self.metrics.record_hit(object.body.len() as u64);
        Ok(Some(value))
    }

    /// Store a value and return it.
    ///
    /// `value: None` is the unstorable "no value" and is rejected; a value
    /// serializing to JSON `null` is stored. `ttl` is in seconds, -1 for no
    /// expiry, and falls back to the configured default when omitted.
    pub async fn set<V: Serialize>(&self, key: &str, value: Option<V>, ttl: Option<i64>) -> Result<V> {
        let value = value.ok_or_else(|| {
            CacheError::serialization("Cannot store an undefined value; store null instead")
        })?;

        let ttl = match ttl {
            Some(seconds) => Ttl::from_seconds(seconds)?,
            None => self.default_ttl,
        };

        let storage_key = self.codec.encode(key)?;

        let body = serde_json::to_vec(&value).map_err(|e| CacheError::Serialization {
            message: format!("Failed to serialize value for key {:?}: {}", key, e),
            source: Some(e),
        })?;

        let now = self.clock.now_millis();
        let metadata = EntryMetadata::new(now, ttl.expires_at(now));
        let size = body.len() as u64;

        let request = PutObject {
            key: storage_key,
            body,
            content_type: JSON_CONTENT_TYPE.to_string(),
            metadata: metadata.to_map(),
            storage_class: self.storage_class.clone(),
            server_side_encryption: self.server_side_encryption.clone(),
        };

        if let Err(e) = self.store.put_object(request).await {
            self.metrics.record_error();
            return Err(CacheError::s3("put", e));
        }

        self.metrics.record_write(size);
        debug!(key = %key, ttl = ttl.as_seconds(), bytes = size, "Cache entry stored");
        Ok(value)
    }

    /// Delete an entry. Deleting a missing key succeeds.
    pub async fn del(&self, key: &str) -> Result<()> {
        let storage_key = self.codec.encode(key)?;

        match self.store.delete_object(&storage_key).await {
            Ok(()) => {
                self.metrics.record_deletes(1);
                debug!(key = %key, "Cache entry deleted");
                Ok(())
            }
            Err(e) if e.is_not_found() => Ok(()),
            Err(e) => {
                self.metrics.record_error();
                Err(CacheError::s3("delete", e))
            }
        }
    }

    /// Delete every entry under the configured prefix.
    ///
    /// Batches run concurrently and are not cancelled when one fails; the
    /// first failed batch is reported, so a failed clear may still have
    /// removed part of the namespace.
    pub async fn clear(&self) -> Result<()> {
        let keys = self.list_all(self.codec.prefix()).await?;
        if keys.is_empty() {
            debug!(prefix = %self.codec.prefix(), "Nothing to clear");
            return Ok(());
        }

        let total = keys.len();
        let batches = keys
            .chunks(MAX_KEYS_PER_DELETE)
            .map(|batch| self.store.delete_objects(batch.to_vec()));
        let results = join_all(batches).await;

        let mut first_error = None;
        let mut deleted = 0u64;
        for (index, result) in results.into_iter().enumerate() {
            match result {
                Ok(()) => {
                    let start = index * MAX_KEYS_PER_DELETE;
                    deleted += (total - start).min(MAX_KEYS_PER_DELETE) as u64;
                }
                Err(e) if first_error.is_none() => first_error = Some(e),
                Err(e) => warn!(batch = index, error = %e, "Suppressed clear batch failure"),
            }
        }
        self.metrics.record_deletes(deleted);

        match first_error {
            Some(e) => {
                self.metrics.record_error();
                Err(CacheError::s3("clear", e))
            }
            None => {
                info!(prefix = %self.codec.prefix(), deleted, "Cache cleared");
                Ok(())
            }
        }
    }

    /// List live entries whose key starts with `pattern`.
    ///
    /// Lists a single page of at most `limit` keys (default 100, capped at
    /// the provider page size) and reads them concurrently. Entries that
    /// are missing, expired or unreadable are left out. A zero limit
    /// returns an empty, complete result without listing.
    pub async fn scan<V: DeserializeOwned>(
        &self,
        pattern: Option<&str>,
        limit: Option<usize>,
    ) -> Result<ScanResult<V>> {
        let limit = limit.unwrap_or(DEFAULT_SCAN_LIMIT).min(MAX_KEYS_PER_PAGE);
        if limit == 0 {
            return Ok(ScanResult {
                cursor: ScanCursor::End,
                entries: Vec::new(),
            });
        }
        let list_prefix = self.codec.encode_pattern(pattern.unwrap_or_default());

        let page = self
            .store
            .list_objects(&list_prefix, limit, None)
            .await
            .map_err(|e| {
                self.metrics.record_error();
                CacheError::s3("scan", e)
            })?;

        let lookups = page.keys.iter().map(|storage_key| async move {
            let key = match self.codec.decode(storage_key) {
                Ok(key) => key,
                Err(e) => {
                    debug!(storage_key = %storage_key, error = %e, "Skipping undecodable key");
                    return None;
                }
            };

            match self.get::<V>(&key).await {
                Ok(Some(data)) => Some(ScanEntry { key, data }),
                Ok(None) => None,
                Err(e) => {
                    debug!(key = %key, error = %e, "Skipping unreadable entry");
                    None
                }
            }
        });
        let entries: Vec<ScanEntry<V>> = join_all(lookups).await.into_iter().flatten().collect();

        let cursor = if page.is_truncated {
            ScanCursor::More(
                page.next_continuation_token
                    .unwrap_or_else(|| ScanCursor::TRUNCATED.to_string()),
            )
        } else {
            ScanCursor::End
        };

        debug!(
            prefix = %list_prefix,
            listed = page.keys.len(),
            returned = entries.len(),
            "Scan complete"
        );
        Ok(ScanResult { cursor, entries })
    }

    /// Probe the bucket. Never fails; check `status` on the report.
    pub async fn health_check(&self) -> HealthReport {
        health::probe(self.store.as_ref()).await
    }

    async fn list_all(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut continuation_token = None;

        loop {
            let page = self
                .store
                .list_objects(prefix, MAX_KEYS_PER_PAGE, continuation_token.take())
                .await
                .map_err(|e| {
                    self.metrics.record_error();
                    CacheError::s3("list", e)
                })?;
            keys.extend(page.keys);

            match (page.is_truncated, page.next_continuation_token) {
                (true, Some(token)) => continuation_token = Some(token),
                (true, None) => {
                    warn!(prefix = %prefix, "Truncated listing without continuation token");
                    break;
                }
                (false, _) => break,
            }
        }

        Ok(keys)
    }

    fn is_expired(&self, storage_key: &str, metadata: &HashMap<String, String>) -> bool {
        expired_at(self.clock.now_millis(), storage_key, metadata)
    }

    fn spawn_expired_delete(&self, storage_key: String) {
        let Ok(handle) = tokio::runtime::Handle::try_current() else {
            debug!(storage_key = %storage_key, "No runtime for expired entry cleanup");
            return;
        };

        let store = Arc::clone(&self.store);
        let clock = Arc::clone(&self.clock);
        handle.spawn(async move {
            match store.get_object(&storage_key).await {
                Ok(object) if expired_at(clock.now_millis(), &storage_key, &object.metadata) => {}
                Ok(_) => {
                    debug!(storage_key = %storage_key, "Expired entry was rewritten; keeping it");
                    return;
                }
                Err(e) if e.is_not_found() => return,
                Err(e) => {
                    warn!(
                        storage_key = %storage_key,
                        error = %e,
                        "Failed to re-read expired entry"
                    );
                    return;
                }
            }

            if let Err(e) = store.delete_object(&storage_key).await {
                warn!(storage_key = %storage_key, error = %e, "Failed to delete expired entry");
            }
        });
    }
}

fn expired_at(now: i64, storage_key: &str, metadata: &HashMap<String, String>) -> bool {
    match stored_expiry(metadata) {
        Ok(Some(expires_at)) => now > expires_at,
        Ok(None) => false,
        Err(raw) => {
            warn!(storage_key = %storage_key, ttl = %raw, "Ignoring malformed ttl metadata");
            false
        }
    }
}

#[async_trait]
impl<V> CacheStore<V> for ObjectCache
where
    V: Serialize + DeserializeOwned + Send + Sync + 'static,
{
    async fn get(&self, key: &str) -> Result<Option<V>> {
        ObjectCache::get(self, key).await
    }

    async fn set(&self, key: &str, value: Option<V>, ttl: Option<i64>) -> Result<V> {
        ObjectCache::set(self, key, value, ttl).await
    }

    async fn del(&self, key: &str) -> Result<()> {
        ObjectCache::del(self, key).await
    }

    async fn clear(&self) -> Result<()> {
        ObjectCache::clear(self).await
    }

    async fn scan(&self, pattern: Option<&str>, limit: Option<usize>) -> Result<ScanResult<V>> {
        ObjectCache::scan(self, pattern, limit).await
    }

    async fn health_check(&self) -> HealthReport {
        ObjectCache::health_check(self).await
    }
}
