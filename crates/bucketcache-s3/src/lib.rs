//! Amazon S3 (and S3-compatible) object store for bucketcache.

mod errors;
mod store;

pub use store::S3ObjectStore;

/// Version of the AWS SDK this adapter is built against.
pub const SDK_VERSION: &str = aws_sdk_s3::meta::PKG_VERSION;
