//! `ObjectStore` implementation over the AWS SDK.

use crate::errors::classify;
use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{Delete, ObjectIdentifier, ServerSideEncryption, StorageClass};
use bucketcache_core::{
    CacheConfig, ObjectPage, ObjectStore, PutObject, Result, StoreError, StoreResult, StoredObject,
};
use tracing::{debug, info};

/// S3-backed object store bound to a single bucket.
#[derive(Clone, Debug)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: String,
}

impl S3ObjectStore {
    /// Build an SDK client from the cache configuration.
    pub async fn connect(config: &CacheConfig) -> Result<Self> {
        config.validate()?;

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(access_key_id), Some(secret_access_key)) =
            (&config.access_key_id, &config.secret_access_key)
        {
            loader = loader.credentials_provider(Credentials::new(
                access_key_id.clone(),
                secret_access_key.clone(),
                config.session_token.clone(),
                None,
                "bucketcache",
            ));
        }

        let shared = loader.load().await;
        let client = Client::from_conf(client_config(&shared, config));

        info!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = config.endpoint.as_deref().unwrap_or("default"),
            "Connected S3 object store"
        );

        Ok(Self::from_client(client, config))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client, config: &CacheConfig) -> Self {
        Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }
}

fn client_config(shared: &SdkConfig, config: &CacheConfig) -> aws_sdk_s3::Config {
    let mut builder = aws_sdk_s3::config::Builder::from(shared)
        .retry_config(
            RetryConfig::standard().with_max_attempts(config.max_retries.saturating_add(1)),
        )
        .timeout_config(
            TimeoutConfig::builder()
                .operation_timeout(config.http_timeout())
                .build(),
        )
        .force_path_style(config.effective_force_path_style());

    if let Some(endpoint) = &config.endpoint {
        builder = builder.endpoint_url(endpoint);
    }

    builder.build()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, request: PutObject) -> StoreResult<()> {
        let PutObject {
            key,
            body,
            content_type,
            metadata,
            storage_class,
            server_side_encryption,
        } = request;

        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .set_metadata(Some(metadata))
            .set_storage_class(storage_class.as_deref().map(StorageClass::from))
            .set_server_side_encryption(
                server_side_encryption
                    .as_deref()
                    .map(ServerSideEncryption::from),
            )
            .send()
            .await
            .map_err(|e| classify(&key, e))?;

        debug!(bucket = %self.bucket, key = %key, "PutObject");
        Ok(())
    }

    async fn get_object(&self, key: &str) -> StoreResult<StoredObject> {
        let output = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(key, e))?;

        let metadata = output.metadata().cloned().unwrap_or_default();
        let content_type = output.content_type().map(str::to_string);
        let storage_class = output.storage_class().map(|class| class.as_str().to_string());
        let server_side_encryption = output
            .server_side_encryption()
            .map(|sse| sse.as_str().to_string());
        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Transport(format!("Failed to read object body: {}", e)))?
            .into_bytes()
            .to_vec();

        Ok(StoredObject {
            body,
            metadata,
            content_type,
            storage_class,
            server_side_encryption,
        })
    }

    async fn delete_object(&self, key: &str) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| classify(key, e))?;
        Ok(())
    }

    async fn delete_objects(&self, keys: Vec<String>) -> StoreResult<()> {
        if keys.is_empty() {
            return Ok(());
        }

        let count = keys.len();
        let objects = keys
            .into_iter()
            .map(|key| ObjectIdentifier::builder().key(key).build())
            .collect::<std::result::Result<Vec<_>, _>>()
            .map_err(|e| StoreError::service(None, e.to_string()))?;

        let delete = Delete::builder()
            .set_objects(Some(objects))
            .quiet(true)
            .build()
            .map_err(|e| StoreError::service(None, e.to_string()))?;

        let output = self
            .client
            .delete_objects()
            .bucket(&self.bucket)
            .delete(delete)
            .send()
            .await
            .map_err(|e| classify(&self.bucket, e))?;

        if let Some(failure) = output.errors().first() {
            return Err(StoreError::Service {
                code: failure.code().map(str::to_string),
                status: None,
                message: format!(
                    "Failed to delete {} ({} of {} keys failed): {}",
                    failure.key().unwrap_or("<unknown>"),
                    output.errors().len(),
                    count,
                    failure.message().unwrap_or("unknown error")
                ),
            });
        }

        debug!(bucket = %self.bucket, count, "DeleteObjects");
        Ok(())
    }

    async fn list_objects(
        &self,
        prefix: &str,
        max_keys: usize,
        continuation_token: Option<String>,
    ) -> StoreResult<ObjectPage> {
        let output = self
            .client
            .list_objects_v2()
            .bucket(&self.bucket)
            .prefix(prefix)
            .max_keys(max_keys.min(i32::MAX as usize) as i32)
            .set_continuation_token(continuation_token)
            .send()
            .await
            .map_err(|e| classify(prefix, e))?;

        let keys = output
            .contents()
            .iter()
            .filter_map(|object| object.key().map(str::to_string))
            .collect();

        Ok(ObjectPage {
            keys,
            is_truncated: output.is_truncated().unwrap_or(false),
            next_continuation_token: output.next_continuation_token().map(str::to_string),
        })
    }

    async fn head_bucket(&self) -> StoreResult<()> {
        self.client
            .head_bucket()
            .bucket(&self.bucket)
            .send()
            .await
            .map_err(|e| classify(&self.bucket, e))?;
        Ok(())
    }

    fn bucket(&self) -> &str {
        &self.bucket
    }

    fn region(&self) -> &str {
        &self.region
    }

    fn sdk_version(&self) -> &str {
        crate::SDK_VERSION
    }
}
