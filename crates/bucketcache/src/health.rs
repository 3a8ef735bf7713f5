//! Health check for the backing bucket.

use bucketcache_core::{HealthReport, HealthStatus, ObjectStore};
use tracing::{debug, warn};

/// Probe the bucket. Every failure becomes an unhealthy report.
pub async fn probe(store: &dyn ObjectStore) -> HealthReport {
    let (status, error) = match store.head_bucket().await {
        Ok(()) => {
            debug!(bucket = %store.bucket(), "Bucket probe succeeded");
            (HealthStatus::Healthy, None)
        }
        Err(e) => {
            warn!(bucket = %store.bucket(), error = %e, "Bucket probe failed");
            (HealthStatus::Unhealthy, Some(e.to_string()))
        }
    };

    HealthReport {
        status,
        bucket: store.bucket().to_string(),
        region: store.region().to_string(),
        sdk_version: store.sdk_version().to_string(),
        error,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryObjectStore;

    #[tokio::test]
    async fn test_probe_healthy() {
        let store = MemoryObjectStore::new("cache");
        let report = probe(&store).await;

        assert!(report.is_healthy());
        assert_eq!(report.bucket, "cache");
        assert_eq!(report.region, "local");
        assert!(report.error.is_none());
    }
}
