//! Cache engine behavior against in-memory and failing stores.

use bucketcache::{ErrorKind, HealthStatus, MemoryObjectStore, ObjectCache, ScanCursor, ScanResult};
use bucketcache_core::StoreError;
use bucketcache_tests::*;
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Duration;

fn faulty(prefix: &str) -> (ObjectCache, Arc<FaultyStore>) {
    init_test_logging();
    let store = Arc::new(FaultyStore::new(MemoryObjectStore::new(TEST_BUCKET)));
    let (cache, _clock) = cache_with_clock(store.clone(), prefix).expect("cache");
    (cache, store)
}

fn server_error() -> StoreError {
    StoreError::Service {
        code: Some("InternalError".to_string()),
        status: Some(500),
        message: "We encountered an internal error. Please try again.".to_string(),
    }
}

#[tokio::test]
async fn test_profile_roundtrip() {
    let (cache, _) = memory_cache("profiles/").unwrap();
    let profile = sample_profile(7);

    cache.set("7", Some(profile.clone()), Some(300)).await.unwrap();
    let fetched: Option<Profile> = cache.get("7").await.unwrap();
    assert_eq!(fetched, Some(profile));
}

#[tokio::test]
async fn test_ttl_expiry_with_manual_clock() {
    let store = Arc::new(MemoryObjectStore::new(TEST_BUCKET));
    let (cache, clock) = cache_with_clock(store.clone(), "").unwrap();

    cache.set("k", Some("v"), Some(1)).await.unwrap();
    clock.advance(Duration::from_millis(1_001));

    let value: Option<String> = cache.get("k").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_get_provider_failure_is_s3_error() {
    let (cache, store) = faulty("");
    cache.set("k", Some(1), None).await.unwrap();
    store.fail(Operation::Get, server_error());

    let err = cache.get::<i32>("k").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::S3Operation);
    assert_eq!(err.status_code(), Some(500));
    assert_eq!(cache.metrics().snapshot().errors, 1);
}

#[tokio::test]
async fn test_get_not_found_status_is_a_miss() {
    let (cache, store) = faulty("");
    store.fail(Operation::Get, StoreError::not_found("k"));

    let value: Option<Value> = cache.get("k").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_set_provider_failure_is_s3_error() {
    let (cache, store) = faulty("");
    store.fail(
        Operation::Put,
        StoreError::Transport("connection reset by peer".to_string()),
    );

    let err = cache.set("k", Some(json!({"a": 1})), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::S3Operation);
    assert_eq!(err.status_code(), None);
    assert!(store.inner().is_empty().await);
}

#[tokio::test]
async fn test_validation_happens_before_storage() {
    let (cache, store) = faulty("");
    store.fail(Operation::Put, server_error());

    let err = cache.set("k", Some(1), Some(0)).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Ttl);

    let err = cache.set::<i32>("k", None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Serialization);

    let err = cache.set("", Some(1), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Configuration);

    assert_eq!(store.inner().operation_counts().puts, 0);
}

#[tokio::test]
async fn test_del_not_found_is_success() {
    let (cache, store) = faulty("");
    store.fail(Operation::Delete, StoreError::not_found("gone"));
    cache.del("gone").await.unwrap();
}

#[tokio::test]
async fn test_del_failure_is_s3_error() {
    let (cache, store) = faulty("");
    store.fail(Operation::Delete, server_error());

    let err = cache.del("k").await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::S3Operation);
}

#[tokio::test]
async fn test_expired_delete_failure_is_not_surfaced() {
    let store = Arc::new(FaultyStore::new(MemoryObjectStore::new(TEST_BUCKET)));
    let (cache, clock) = cache_with_clock(store.clone(), "").unwrap();
    cache.set("k", Some(1), Some(1)).await.unwrap();
    store.fail(Operation::Delete, server_error());

    clock.advance(Duration::from_secs(2));
    let value: Option<i32> = cache.get("k").await.unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn test_clear_reports_first_batch_failure() {
    let (cache, store) = faulty("bulk/");
    for i in 0..2_500 {
        cache.set(&format!("{:05}", i), Some(i), None).await.unwrap();
    }
    store.fail_batch(1, server_error());
    store.fail_batch(
        2,
        StoreError::Service {
            code: Some("SlowDown".to_string()),
            status: Some(503),
            message: "Please reduce your request rate.".to_string(),
        },
    );

    let err = cache.clear().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::S3Operation);
    assert_eq!(err.status_code(), Some(500));

    // Batches are not cancelled: the healthy one still ran.
    assert!(store.completed_batches().contains(&0));
    assert_eq!(store.inner().len().await, 1_500);
}

#[tokio::test]
async fn test_clear_list_failure_is_s3_error() {
    let (cache, store) = faulty("");
    store.fail(Operation::List, server_error());

    let err = cache.clear().await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::S3Operation);
}

#[tokio::test]
async fn test_clear_then_get_misses() {
    let (cache, _) = memory_cache("app/").unwrap();
    let keys: Vec<String> = (0..20).map(|i| format!("item/{}", i)).collect();
    for key in &keys {
        cache.set(key, Some(key.clone()), None).await.unwrap();
    }

    cache.clear().await.unwrap();

    for key in &keys {
        let value: Option<String> = cache.get(key).await.unwrap();
        assert_eq!(value, None, "{} should be gone", key);
    }
}

#[tokio::test]
async fn test_scan_three_entries() {
    let (cache, _) = memory_cache("").unwrap();
    for i in 1..=3 {
        cache
            .set(&format!("scan:{}", i), Some(json!({"n": i})), None)
            .await
            .unwrap();
    }

    let result: ScanResult<Value> = cache.scan(Some(""), Some(10)).await.unwrap();
    assert_eq!(result.cursor, ScanCursor::End);
    assert_eq!(result.entries.len(), 3);
    for (i, entry) in result.entries.iter().enumerate() {
        assert_eq!(entry.key, format!("scan:{}", i + 1));
        assert_eq!(entry.data, json!({"n": i + 1}));
    }

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["cursor"], json!(0));
}

#[tokio::test]
async fn test_scan_drops_entries_that_fail_to_read() {
    let (cache, store) = faulty("");
    cache.set("a", Some(1), None).await.unwrap();
    cache.set("b", Some(2), None).await.unwrap();
    store.fail(Operation::Get, server_error());

    let result: ScanResult<i32> = cache.scan(None, None).await.unwrap();
    assert!(result.entries.is_empty());
    assert!(result.cursor.is_end());
}

#[tokio::test]
async fn test_scan_list_failure_is_s3_error() {
    let (cache, store) = faulty("");
    store.fail(Operation::List, server_error());

    let err = cache.scan::<Value>(None, None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::S3Operation);
}

#[tokio::test]
async fn test_scan_limit_is_capped_to_one_page() {
    let (cache, store) = memory_cache("").unwrap();
    for i in 0..1_200 {
        store
            .insert(
                format!("k{:04}", i),
                bucketcache_core::StoredObject {
                    body: b"1".to_vec(),
                    ..Default::default()
                },
            )
            .await;
    }

    let result: ScanResult<i32> = cache.scan(None, Some(5_000)).await.unwrap();
    assert_eq!(result.entries.len(), 1_000);
    assert!(!result.cursor.is_end());
    assert_eq!(store.operation_counts().lists, 1);
}

#[tokio::test]
async fn test_health_check_healthy() {
    let (cache, _) = faulty("");
    let report = cache.health_check().await;
    assert_eq!(report.status, HealthStatus::Healthy);
    assert_eq!(report.bucket, TEST_BUCKET);
    assert_eq!(report.error, None);
}

#[tokio::test]
async fn test_health_check_failure_is_data() {
    let (cache, store) = faulty("");
    store.fail(
        Operation::HeadBucket,
        StoreError::Service {
            code: None,
            status: Some(403),
            message: "Forbidden".to_string(),
        },
    );

    let report = cache.health_check().await;
    assert_eq!(report.status, HealthStatus::Unhealthy);
    assert_eq!(report.error.as_deref(), Some("HTTP 403: Forbidden"));

    store.heal(Operation::HeadBucket);
    assert!(cache.health_check().await.is_healthy());
}
