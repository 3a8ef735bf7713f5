//! CLI command definitions.

use bucketcache::CacheConfig;
use clap::{Args, Subcommand};

#[derive(Subcommand)]
pub enum Commands {
    /// Read a value
    Get {
        /// Cache key
        key: String,
    },

    /// Store a value
    Set {
        /// Cache key
        key: String,

        /// JSON value (plain text is stored as a string)
        value: String,

        /// TTL in seconds, -1 for no expiry
        #[arg(short, long, allow_negative_numbers = true)]
        ttl: Option<i64>,
    },

    /// Delete a value
    Del {
        /// Cache key
        key: String,
    },

    /// Delete every entry under the prefix
    Clear,

    /// List live entries
    Scan {
        /// Key prefix to match
        #[arg(short, long)]
        pattern: Option<String>,

        /// Maximum number of keys to list
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Probe the bucket
    Health,
}

/// Flags that take precedence over `BUCKETCACHE_*` variables.
#[derive(Args, Debug, Default)]
pub struct ConfigOverrides {
    /// Bucket name
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Key prefix
    #[arg(long, global = true)]
    pub prefix: Option<String>,

    /// Bucket region
    #[arg(long, global = true)]
    pub region: Option<String>,

    /// Alternate S3 endpoint (e.g. http://localhost:9000)
    #[arg(long, global = true)]
    pub endpoint: Option<String>,
}

impl ConfigOverrides {
    pub fn apply(self, mut config: CacheConfig) -> CacheConfig {
        if let Some(bucket) = self.bucket {
            config.bucket = bucket;
        }
        if let Some(prefix) = self.prefix {
            config.prefix = prefix;
        }
        if let Some(region) = self.region {
            config.region = region;
        }
        if let Some(endpoint) = self.endpoint {
            config.endpoint = Some(endpoint);
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_overrides_win() {
        let overrides = ConfigOverrides {
            bucket: Some("cli-bucket".to_string()),
            prefix: None,
            region: Some("eu-west-1".to_string()),
            endpoint: None,
        };

        let config = overrides.apply(CacheConfig::new("env-bucket").with_prefix("env/"));
        assert_eq!(config.bucket, "cli-bucket");
        assert_eq!(config.prefix, "env/");
        assert_eq!(config.region, "eu-west-1");
    }
}
