//! Cache value types and storage request/response shapes.

use crate::error::{CacheError, Result};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Largest page a single listing call may return.
pub const MAX_KEYS_PER_PAGE: usize = 1000;
/// Largest number of keys accepted by one multi-object delete.
pub const MAX_KEYS_PER_DELETE: usize = 1000;

/// Metadata attribute holding the creation time (epoch ms).
pub const META_CREATED: &str = "created";
/// Metadata attribute holding the metadata schema version.
pub const META_VERSION: &str = "version";
/// Metadata attribute holding the absolute expiry (epoch ms).
pub const META_TTL: &str = "ttl";
pub const SCHEMA_VERSION: &str = "1.0";
pub const JSON_CONTENT_TYPE: &str = "application/json";

/// Time-to-live of a cache entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// Entry never expires.
    Infinite,
    /// Entry expires this many seconds after it is written.
    Seconds(u64),
}

impl Ttl {
    /// Raw TTL value meaning "never expires".
    pub const INFINITE: i64 = -1;

    /// Validate a raw TTL: -1 or a positive number of seconds.
    pub fn from_seconds(seconds: i64) -> Result<Self> {
        match seconds {
            Self::INFINITE => Ok(Ttl::Infinite),
            s if s > 0 => Ok(Ttl::Seconds(s as u64)),
            s => Err(CacheError::Ttl(format!(
                "TTL must be a positive number of seconds or -1, got {}",
                s
            ))),
        }
    }

    /// Absolute expiry for an entry written at `now_millis`.
    pub fn expires_at(&self, now_millis: i64) -> Option<i64> {
        match self {
            Ttl::Infinite => None,
            Ttl::Seconds(s) => Some(now_millis.saturating_add((*s as i64).saturating_mul(1000))),
        }
    }

    pub fn as_seconds(&self) -> i64 {
        match self {
            Ttl::Infinite => Self::INFINITE,
            Ttl::Seconds(s) => *s as i64,
        }
    }
}

/// Attribute metadata attached to every stored entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMetadata {
    pub created_at: i64,
    pub expires_at: Option<i64>,
    pub version: String,
}

impl EntryMetadata {
    pub fn new(created_at: i64, expires_at: Option<i64>) -> Self {
        Self {
            created_at,
            expires_at,
            version: SCHEMA_VERSION.to_string(),
        }
    }

    /// Render as object metadata. `ttl` is omitted for infinite entries.
    pub fn to_map(&self) -> HashMap<String, String> {
        let mut map = HashMap::from([
            (META_CREATED.to_string(), self.created_at.to_string()),
            (META_VERSION.to_string(), self.version.clone()),
        ]);
        if let Some(expires_at) = self.expires_at {
            map.insert(META_TTL.to_string(), expires_at.to_string());
        }
        map
    }
}

/// Read the stored expiry. `Err` carries the raw attribute when it is not a number.
pub fn stored_expiry(metadata: &HashMap<String, String>) -> std::result::Result<Option<i64>, String> {
    match metadata.get(META_TTL) {
        None => Ok(None),
        Some(raw) => raw.trim().parse::<i64>().map(Some).map_err(|_| raw.clone()),
    }
}

/// Object write request.
#[derive(Debug, Clone, Default)]
pub struct PutObject {
    pub key: String,
    pub body: Vec<u8>,
    pub content_type: String,
    pub metadata: HashMap<String, String>,
    pub storage_class: Option<String>,
    pub server_side_encryption: Option<String>,
}

/// Object returned by a read.
#[derive(Debug, Clone, Default)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub metadata: HashMap<String, String>,
    pub content_type: Option<String>,
    pub storage_class: Option<String>,
    pub server_side_encryption: Option<String>,
}

/// One page of a prefix listing.
#[derive(Debug, Clone, Default)]
pub struct ObjectPage {
    pub keys: Vec<String>,
    pub is_truncated: bool,
    pub next_continuation_token: Option<String>,
}

/// Position returned by a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanCursor {
    /// The listing was complete.
    End,
    /// More objects may exist; the token is opaque.
    More(String),
}

impl ScanCursor {
    /// Token used when the provider reports truncation without a continuation token.
    pub const TRUNCATED: &'static str = "truncated";

    pub fn is_end(&self) -> bool {
        matches!(self, ScanCursor::End)
    }
}

impl fmt::Display for ScanCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanCursor::End => f.write_str("0"),
            ScanCursor::More(token) => f.write_str(token),
        }
    }
}

impl Serialize for ScanCursor {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            ScanCursor::End => serializer.serialize_u8(0),
            ScanCursor::More(token) => serializer.serialize_str(token),
        }
    }
}

/// A live entry found by a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanEntry<V> {
    pub key: String,
    pub data: V,
}

/// Result of a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScanResult<V> {
    pub cursor: ScanCursor,
    pub entries: Vec<ScanEntry<V>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
}

/// Outcome of a bucket probe. Failures are reported here, never as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub status: HealthStatus,
    pub bucket: String,
    pub region: String,
    pub sdk_version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}
