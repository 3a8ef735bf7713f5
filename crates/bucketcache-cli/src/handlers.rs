//! Command handlers.

use bucketcache::{ObjectCache, ScanResult};
use serde::Serialize;
use serde_json::Value;
use std::process::ExitCode;
use tracing::info;

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse a CLI value as JSON, falling back to a plain string.
pub fn parse_value(raw: String) -> Value {
    serde_json::from_str(&raw).unwrap_or(Value::String(raw))
}

/// Print the value, or `null` on a miss.
pub async fn get(cache: &ObjectCache, key: &str) -> anyhow::Result<ExitCode> {
    let value = cache.get::<Value>(key).await?;
    if value.is_none() {
        info!(key = %key, "Cache miss");
    }
    print_json(&value.unwrap_or(Value::Null))?;
    Ok(ExitCode::SUCCESS)
}

pub async fn set(
    cache: &ObjectCache,
    key: &str,
    raw: String,
    ttl: Option<i64>,
) -> anyhow::Result<ExitCode> {
    let stored = cache.set(key, Some(parse_value(raw)), ttl).await?;
    print_json(&stored)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn del(cache: &ObjectCache, key: &str) -> anyhow::Result<ExitCode> {
    cache.del(key).await?;
    info!(key = %key, "Deleted");
    Ok(ExitCode::SUCCESS)
}

pub async fn clear(cache: &ObjectCache) -> anyhow::Result<ExitCode> {
    cache.clear().await?;
    info!(prefix = %cache.codec().prefix(), "Cleared");
    Ok(ExitCode::SUCCESS)
}

pub async fn scan(
    cache: &ObjectCache,
    pattern: Option<&str>,
    limit: Option<usize>,
) -> anyhow::Result<ExitCode> {
    let result: ScanResult<Value> = cache.scan(pattern, limit).await?;
    print_json(&result)?;
    Ok(ExitCode::SUCCESS)
}

pub async fn health(cache: &ObjectCache) -> anyhow::Result<ExitCode> {
    let report = cache.health_check().await;
    print_json(&report)?;
    Ok(if report.is_healthy() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
