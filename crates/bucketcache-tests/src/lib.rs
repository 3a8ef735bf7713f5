//! Integration test infrastructure for bucketcache.
//!
//! Provides a fault-injecting object store for exercising error paths and
//! a testcontainers-based MinIO for running against a real S3 API.
//!
//! # Usage
//!
//! ```ignore
//! use bucketcache_tests::{FaultyStore, Operation};
//!
//! let store = Arc::new(FaultyStore::default());
//! store.fail(Operation::Get, StoreError::service(Some(500), "boom"));
//! ```

pub mod containers;
pub mod faults;
pub mod fixtures;

pub use faults::{FaultyStore, Operation};
pub use fixtures::*;

/// Initialize test logging (call once per test binary).
pub fn init_test_logging() {
    use tracing_subscriber::{EnvFilter, fmt};

    let _ = fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("warn,bucketcache=debug")),
        )
        .with_test_writer()
        .try_init();
}
