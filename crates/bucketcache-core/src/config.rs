//! Cache configuration.

use crate::error::{CacheError, Result};
use crate::types::Ttl;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Prefix of the environment variables read by [`CacheConfig::from_env`].
pub const ENV_PREFIX: &str = "BUCKETCACHE";

/// Configuration for an object-storage backed cache.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Target bucket.
    #[serde(default)]
    pub bucket: String,
    /// Bucket region.
    #[serde(default = "default_region")]
    pub region: String,
    /// Namespace prepended to every storage key.
    #[serde(default)]
    pub prefix: String,
    /// TTL in seconds applied when `set` gets none; -1 disables expiry.
    #[serde(default = "default_ttl")]
    pub default_ttl: i64,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
    pub session_token: Option<String>,
    /// Storage class passed to every write (e.g. `STANDARD_IA`).
    pub storage_class: Option<String>,
    /// Server-side encryption passed to every write (e.g. `AES256`).
    pub server_side_encryption: Option<String>,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_http_timeout_ms")]
    pub http_timeout_ms: u64,
    /// Alternate endpoint, e.g. a local MinIO.
    pub endpoint: Option<String>,
    /// Path-style addressing; defaults to on when `endpoint` is set.
    pub force_path_style: Option<bool>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_ttl() -> i64 {
    60
}

fn default_max_retries() -> u32 {
    3
}

fn default_http_timeout_ms() -> u64 {
    30_000
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            bucket: String::new(),
            region: default_region(),
            prefix: String::new(),
            default_ttl: default_ttl(),
            access_key_id: None,
            secret_access_key: None,
            session_token: None,
            storage_class: None,
            server_side_encryption: None,
            max_retries: default_max_retries(),
            http_timeout_ms: default_http_timeout_ms(),
            endpoint: None,
            force_path_style: None,
        }
    }
}

impl CacheConfig {
    /// Create a config for a bucket with defaults for everything else.
    pub fn new(bucket: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            ..Default::default()
        }
    }

    /// Load from `BUCKETCACHE_*` environment variables (and `.env`, if present).
    pub fn from_env() -> Result<Self> {
        let config = Self::load_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Like [`from_env`](Self::from_env) but leaves validation to the caller,
    /// so values can be overridden first.
    pub fn load_env() -> Result<Self> {
        let _ = dotenvy::dotenv();
        Self::from_environment(::config::Environment::with_prefix(ENV_PREFIX))
    }

    /// Load from an explicit set of `BUCKETCACHE_*` variables.
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let source = vars
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        let config =
            Self::from_environment(::config::Environment::with_prefix(ENV_PREFIX).source(Some(source)))?;
        config.validate()?;
        Ok(config)
    }

    fn from_environment(environment: ::config::Environment) -> Result<Self> {
        let config: Self = ::config::Config::builder()
            .add_source(environment.try_parsing(true))
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| CacheError::Configuration(format!("Failed to load config: {}", e)))?;
        Ok(config)
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = region.into();
        self
    }

    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_default_ttl(mut self, seconds: i64) -> Self {
        self.default_ttl = seconds;
        self
    }

    /// Use explicit credentials instead of the default provider chain.
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self.session_token = session_token;
        self
    }

    pub fn with_storage_class(mut self, storage_class: impl Into<String>) -> Self {
        self.storage_class = Some(storage_class.into());
        self
    }

    pub fn with_server_side_encryption(mut self, sse: impl Into<String>) -> Self {
        self.server_side_encryption = Some(sse.into());
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_force_path_style(mut self, enabled: bool) -> Self {
        self.force_path_style = Some(enabled);
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout_ms = timeout.as_millis() as u64;
        self
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_millis(self.http_timeout_ms)
    }

    /// Path-style addressing after applying the endpoint default.
    pub fn effective_force_path_style(&self) -> bool {
        self.force_path_style.unwrap_or(self.endpoint.is_some())
    }

    /// Validated default TTL.
    pub fn ttl(&self) -> Result<Ttl> {
        Ttl::from_seconds(self.default_ttl).map_err(|_| {
            CacheError::Configuration(format!(
                "default_ttl must be a positive number of seconds or -1, got {}",
                self.default_ttl
            ))
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(CacheError::Configuration("bucket is required".to_string()));
        }

        self.ttl()?;

        match (&self.access_key_id, &self.secret_access_key) {
            (Some(_), None) | (None, Some(_)) => {
                return Err(CacheError::Configuration(
                    "access_key_id and secret_access_key must be provided together".to_string(),
                ));
            }
            _ => {}
        }

        if self.session_token.is_some() && self.access_key_id.is_none() {
            return Err(CacheError::Configuration(
                "session_token requires access_key_id and secret_access_key".to_string(),
            ));
        }

        if self.http_timeout_ms == 0 {
            return Err(CacheError::Configuration(
                "http_timeout_ms must be greater than zero".to_string(),
            ));
        }

        Ok(())
    }
}
