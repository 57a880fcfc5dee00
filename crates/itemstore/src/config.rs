use std::{env, time::Duration};

use itemstore_core::lock::DEFAULT_LOCK_DURATION_SECONDS;
use itemstore_core::schema::TableRegistry;

/// Store configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Prefix prepended to every table name (default: "")
    pub table_prefix: String,
    /// Default lease length in seconds (default: 600)
    pub lock_duration_seconds: i64,
    /// Map cache TTL in seconds (default: 300)
    pub map_cache_ttl_seconds: u64,
    /// Maximum number of cached map entries (default: 10,000)
    pub map_cache_max_entries: usize,
    /// Deadline for a single store operation in milliseconds (default: 10,000)
    pub operation_timeout_ms: u64,
    /// Endpoint override, e.g. a local DynamoDB (default: none)
    pub endpoint_url: Option<String>,
    /// AWS region (default: "us-east-1")
    pub region: String,
}

impl StoreConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `ITEMSTORE_TABLE_PREFIX` - Table name prefix (default: "")
    /// - `ITEMSTORE_LOCK_DURATION_SECONDS` - Lease length (default: 600)
    /// - `ITEMSTORE_MAP_CACHE_TTL_SECONDS` - Map cache TTL (default: 300)
    /// - `ITEMSTORE_MAP_CACHE_MAX_ENTRIES` - Map cache size (default: 10,000)
    /// - `ITEMSTORE_OPERATION_TIMEOUT_MS` - Operation deadline (default: 10,000)
    /// - `AWS_ENDPOINT_URL` - Endpoint override (default: none)
    /// - `AWS_REGION` - AWS region (default: "us-east-1")
    pub fn from_env() -> Self {
        Self {
            table_prefix: env::var("ITEMSTORE_TABLE_PREFIX").unwrap_or_default(),
            lock_duration_seconds: env::var("ITEMSTORE_LOCK_DURATION_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i64| *v > 0)
                .unwrap_or(DEFAULT_LOCK_DURATION_SECONDS),
            map_cache_ttl_seconds: env::var("ITEMSTORE_MAP_CACHE_TTL_SECONDS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(300),
            map_cache_max_entries: env::var("ITEMSTORE_MAP_CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(10_000),
            operation_timeout_ms: env::var("ITEMSTORE_OPERATION_TIMEOUT_MS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10_000),
            endpoint_url: env::var("AWS_ENDPOINT_URL").ok().filter(|v| !v.is_empty()),
            region: env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string()),
        }
    }

    /// Table names for this deployment.
    pub fn tables(&self) -> TableRegistry {
        TableRegistry::with_prefix(self.table_prefix.clone())
    }

    /// Get map cache TTL as a Duration.
    pub fn map_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.map_cache_ttl_seconds)
    }

    /// Get the operation deadline as a Duration.
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            table_prefix: String::new(),
            lock_duration_seconds: DEFAULT_LOCK_DURATION_SECONDS,
            map_cache_ttl_seconds: 300,
            map_cache_max_entries: 10_000,
            operation_timeout_ms: 10_000,
            endpoint_url: None,
            region: "us-east-1".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duration_conversions() {
        let config = StoreConfig {
            map_cache_ttl_seconds: 60,
            operation_timeout_ms: 2_500,
            ..StoreConfig::default()
        };

        assert_eq!(config.map_cache_ttl(), Duration::from_secs(60));
        assert_eq!(config.operation_timeout(), Duration::from_millis(2_500));
    }

    #[test]
    fn test_tables_use_prefix() {
        let config = StoreConfig {
            table_prefix: "prod-".to_string(),
            ..StoreConfig::default()
        };

        assert_eq!(config.tables().items_table(), "prod-items");
        assert_eq!(config.tables().locks_table(), "prod-locks");
    }

    #[test]
    fn test_default_values() {
        let config = StoreConfig::default();

        assert_eq!(config.table_prefix, "");
        assert_eq!(config.lock_duration_seconds, 600);
        assert_eq!(config.map_cache_ttl_seconds, 300);
        assert_eq!(config.map_cache_max_entries, 10_000);
        assert_eq!(config.operation_timeout_ms, 10_000);
        assert_eq!(config.region, "us-east-1");
    }
}
