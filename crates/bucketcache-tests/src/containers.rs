//! Testcontainer configurations for integration tests.

use bucketcache::CacheConfig;
use testcontainers::runners::AsyncRunner;
use testcontainers::{ContainerAsync, ImageExt};
use testcontainers_modules::minio::MinIO;

/// MinIO container standing in for S3.
pub struct MinioContainer {
    #[allow(dead_code)] // Kept to maintain container lifetime
    container: ContainerAsync<MinIO>,
    endpoint: String,
    access_key: String,
    secret_key: String,
}

impl MinioContainer {
    pub async fn start() -> anyhow::Result<Self> {
        let container = MinIO::default().with_tag("latest").start().await?;

        let host = container.get_host().await?;
        let port = container.get_host_port_ipv4(9000).await?;

        let endpoint = format!("http://{}:{}", host, port);
        let access_key = "minioadmin".to_string();
        let secret_key = "minioadmin".to_string();

        Ok(Self {
            container,
            endpoint,
            access_key,
            secret_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Cache configuration pointing at this container.
    pub fn cache_config(&self, bucket: &str, prefix: &str) -> CacheConfig {
        CacheConfig::new(bucket)
            .with_prefix(prefix)
            .with_endpoint(self.endpoint.clone())
            .with_credentials(self.access_key.clone(), self.secret_key.clone(), None)
            .with_max_retries(1)
    }
}
