//! Error types for bucketcache.

use thiserror::Error;

/// Failure reported by an [`ObjectStore`](crate::ports::ObjectStore) implementation.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// The object (or bucket) does not exist.
    #[error("Object not found: {key}")]
    NotFound { key: String },

    /// The provider answered with an error response.
    #[error("{}", service_message(.code, .status, .message))]
    Service {
        code: Option<String>,
        status: Option<u16>,
        message: String,
    },

    /// The request never produced a provider response (DNS, TLS, timeout...).
    #[error("Transport error: {0}")]
    Transport(String),
}

fn service_message(code: &Option<String>, status: &Option<u16>, message: &str) -> String {
    match (code, status) {
        (Some(code), Some(status)) => format!("{} ({}): {}", code, status, message),
        (Some(code), None) => format!("{}: {}", code, message),
        (None, Some(status)) => format!("HTTP {}: {}", status, message),
        (None, None) => message.to_string(),
    }
}

impl StoreError {
    pub fn not_found(key: impl Into<String>) -> Self {
        StoreError::NotFound { key: key.into() }
    }

    pub fn service(status: Option<u16>, message: impl Into<String>) -> Self {
        StoreError::Service {
            code: None,
            status,
            message: message.into(),
        }
    }

    /// Whether this failure means "nothing stored under this key".
    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }

    /// HTTP status reported by the provider, when there was a response.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            StoreError::NotFound { .. } => Some(404),
            StoreError::Service { status, .. } => *status,
            StoreError::Transport(_) => None,
        }
    }
}

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Stable classification of a [`CacheError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Ttl,
    Serialization,
    S3Operation,
}

#[derive(Debug, Error)]
pub enum CacheError {
    /// Invalid constructor options or an invalid cache key.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// TTL is neither -1 nor a positive number of seconds.
    #[error("Invalid TTL: {0}")]
    Ttl(String),

    #[error("Serialization error: {message}")]
    Serialization {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    /// The storage provider failed for a reason other than "not found".
    #[error("S3 {operation} failed: {source}")]
    S3Operation {
        operation: &'static str,
        status_code: Option<u16>,
        #[source]
        source: StoreError,
    },
}

impl CacheError {
    pub fn serialization(message: impl Into<String>) -> Self {
        CacheError::Serialization {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a storage failure, keeping the provider status code.
    pub fn s3(operation: &'static str, source: StoreError) -> Self {
        CacheError::S3Operation {
            operation,
            status_code: source.status_code(),
            source,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            CacheError::Configuration(_) => ErrorKind::Configuration,
            CacheError::Ttl(_) => ErrorKind::Ttl,
            CacheError::Serialization { .. } => ErrorKind::Serialization,
            CacheError::S3Operation { .. } => ErrorKind::S3Operation,
        }
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            CacheError::S3Operation { status_code, .. } => *status_code,
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, CacheError>;

impl From<serde_json::Error> for CacheError {
    fn from(err: serde_json::Error) -> Self {
        CacheError::Serialization {
            message: err.to_string(),
            source: Some(err),
        }
    }
}
