//! Test fixtures and cache builders.

use bucketcache::{CacheConfig, MemoryObjectStore, ObjectCache};
use bucketcache_core::{ManualClock, ObjectStore};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Fixed start time for clock-driven tests (2023-11-14T22:13:20Z).
pub const TEST_EPOCH_MS: i64 = 1_700_000_000_000;

pub const TEST_BUCKET: &str = "bucketcache-test";

/// Structured payload used across tests.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub name: String,
    pub tags: Vec<String>,
}

pub fn sample_profile(id: u64) -> Profile {
    Profile {
        id,
        name: format!("user-{}", id),
        tags: vec!["beta".to_string(), "eu".to_string()],
    }
}

pub fn test_config(prefix: &str) -> CacheConfig {
    CacheConfig::new(TEST_BUCKET).with_prefix(prefix)
}

/// Cache over `store` driven by a manual clock.
pub fn cache_with_clock(
    store: Arc<dyn ObjectStore>,
    prefix: &str,
) -> anyhow::Result<(ObjectCache, Arc<ManualClock>)> {
    let clock = Arc::new(ManualClock::new(TEST_EPOCH_MS));
    let cache = ObjectCache::new(&test_config(prefix), store)?.with_clock(clock.clone());
    Ok((cache, clock))
}

/// Cache over a fresh in-memory store.
pub fn memory_cache(prefix: &str) -> anyhow::Result<(ObjectCache, Arc<MemoryObjectStore>)> {
    let store = Arc::new(MemoryObjectStore::new(TEST_BUCKET));
    let cache = ObjectCache::new(&test_config(prefix), store.clone())?;
    Ok((cache, store))
}
