//! Key-value cache on top of object storage (S3/R2/MinIO compatible).
//!
//! [`ObjectCache`] maps cache keys onto storage objects, keeps per-entry
//! TTLs in object metadata and evaluates expiry lazily on read.

pub mod cache;
pub mod health;
pub mod keys;
pub mod memory;
pub mod metrics;

pub use bucketcache_core::{
    CacheConfig, CacheError, CacheStore, ErrorKind, HealthReport, HealthStatus, ObjectStore,
    Result, ScanCursor, ScanEntry, ScanResult, StoreError, Ttl,
};
pub use cache::{DEFAULT_SCAN_LIMIT, ObjectCache};
pub use keys::KeyCodec;
pub use memory::MemoryObjectStore;
pub use metrics::{CacheMetrics, MetricsSnapshot};

#[cfg(feature = "s3")]
pub use bucketcache_s3::S3ObjectStore;
