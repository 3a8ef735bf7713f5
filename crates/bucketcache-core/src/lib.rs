//! bucketcache core
//!
//! Shared vocabulary for the object-storage backed cache: the error
//! taxonomy, the port traits that separate the cache engine from the
//! storage provider, and the value types returned by cache operations.

pub mod clock;
pub mod config;
pub mod error;
pub mod ports;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use crate::config::CacheConfig;
pub use error::{CacheError, ErrorKind, Result, StoreError, StoreResult};
pub use ports::{CacheStore, ObjectStore};
pub use types::*;
