//! Configuration types shared across crates.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Top-level application configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata database configuration.
    pub database: DatabaseConfig,
    /// File cache / coordination store configuration.
    #[serde(default)]
    pub cache: CacheConfig,
    /// Storage buckets available for new-file assignment.
    pub buckets: BucketsConfig,
    /// Upload notification queue configuration.
    #[serde(default)]
    pub notification: NotificationConfig,
    /// Retention scavenger configuration.
    #[serde(default)]
    pub scavenger: ScavengerConfig,
    /// Object storage (signed URL) configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

impl AppConfig {
    /// Create a test configuration backed by in-process collaborators.
    ///
    /// **For testing only.** Uses an in-memory SQLite database, a disabled
    /// notification queue, and the local signed-URL provider.
    pub fn for_testing() -> Self {
        Self {
            server: ServerConfig::default(),
            database: DatabaseConfig::Sqlite {
                path: PathBuf::from(":memory:"),
            },
            cache: CacheConfig {
                enabled: false,
                ..CacheConfig::default()
            },
            buckets: BucketsConfig {
                names: vec!["test-bucket-1".to_string(), "test-bucket-2".to_string()],
            },
            notification: NotificationConfig {
                enabled: false,
                ..NotificationConfig::default()
            },
            scavenger: ScavengerConfig {
                enabled: false,
                ..ScavengerConfig::default()
            },
            storage: StorageConfig::default(),
        }
    }
}

/// HTTP server configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Enable the /metrics endpoint for Prometheus scraping (default: true).
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Metadata database configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum DatabaseConfig {
    /// SQLite database. Recommended for tests and single-node deployments.
    Sqlite {
        /// Database file path, or ":memory:".
        path: PathBuf,
    },
    /// PostgreSQL database.
    Postgres {
        host: String,
        #[serde(default = "default_pg_port")]
        port: u16,
        username: Option<String>,
        /// Password. Prefer supplying this via CABINET_DATABASE__PASSWORD.
        password: Option<String>,
        database: String,
        #[serde(default = "default_pg_max_connections")]
        max_connections: u32,
        /// Server-side statement timeout; bounds scavenger batch deletes.
        #[serde(default)]
        statement_timeout_ms: Option<u64>,
    },
}

fn default_pg_port() -> u16 {
    5432
}

fn default_pg_max_connections() -> u32 {
    10
}

/// File cache and leader lock configuration.
///
/// The cache is strictly an optimization: with `enabled = false` every cache
/// operation is a no-op and the leader lock degrades to always-acquired,
/// which is only safe for single-replica deployments.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Whether the Redis cache is enabled.
    #[serde(default = "default_cache_enabled")]
    pub enabled: bool,
    #[serde(default = "default_cache_host")]
    pub host: String,
    #[serde(default = "default_cache_port")]
    pub port: u16,
    pub password: Option<String>,
    /// Redis logical database index.
    #[serde(default)]
    pub database: i64,
    /// TTL for cached file snapshots.
    #[serde(default = "default_file_ttl_secs")]
    pub file_ttl_secs: u64,
    /// Well-known key used for the cluster leader lock.
    #[serde(default = "default_lock_key")]
    pub lock_key: String,
    /// Leader lock lifetime. Deliberately short so a crashed leader's lock
    /// expires on its own.
    #[serde(default = "default_lock_ttl_secs")]
    pub lock_ttl_secs: u64,
}

fn default_cache_enabled() -> bool {
    true
}

fn default_cache_host() -> String {
    "127.0.0.1".to_string()
}

fn default_cache_port() -> u16 {
    6379
}

fn default_file_ttl_secs() -> u64 {
    2 * 60 * 60
}

fn default_lock_key() -> String {
    "cabinet-leader".to_string()
}

fn default_lock_ttl_secs() -> u64 {
    10
}

impl CacheConfig {
    /// TTL applied to cached file snapshots.
    pub fn file_ttl(&self) -> Duration {
        Duration::from_secs(self.file_ttl_secs)
    }

    /// Leader lock lifetime.
    pub fn lock_ttl(&self) -> Duration {
        Duration::from_secs(self.lock_ttl_secs)
    }

    /// Redis connection URL (password elided from Debug output by redis-rs).
    pub fn url(&self) -> String {
        match &self.password {
            Some(password) => format!(
                "redis://:{}@{}:{}/{}",
                password, self.host, self.port, self.database
            ),
            None => format!("redis://{}:{}/{}", self.host, self.port, self.database),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_cache_enabled(),
            host: default_cache_host(),
            port: default_cache_port(),
            password: None,
            database: 0,
            file_ttl_secs: default_file_ttl_secs(),
            lock_key: default_lock_key(),
            lock_ttl_secs: default_lock_ttl_secs(),
        }
    }
}

/// Storage buckets configured for new-file assignment.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BucketsConfig {
    /// Bucket names. Reconciled into the bucket table at startup; the
    /// non-archived set forms the rotation for the process lifetime.
    pub names: Vec<String>,
}

/// Upload notification queue configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NotificationConfig {
    /// Whether the upload reconciler runs.
    #[serde(default = "default_notification_enabled")]
    pub enabled: bool,
    /// Queue name holding upload-completion notifications.
    #[serde(default = "default_queue_name")]
    pub queue_name: String,
    /// Custom queue endpoint for local stacks; cloud runs resolve the
    /// default endpoint from the ambient AWS configuration.
    pub endpoint: Option<String>,
    /// Long-poll wait per receive call, in seconds (SQS caps this at 20).
    #[serde(default = "default_wait_secs")]
    pub wait_secs: u32,
}

fn default_notification_enabled() -> bool {
    true
}

fn default_queue_name() -> String {
    "cabinet-upload-notifications".to_string()
}

fn default_wait_secs() -> u32 {
    10
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            enabled: default_notification_enabled(),
            queue_name: default_queue_name(),
            endpoint: None,
            wait_secs: default_wait_secs(),
        }
    }
}

/// Retention scavenger configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScavengerConfig {
    /// Whether the daily scavenger task runs.
    #[serde(default = "default_scavenger_enabled")]
    pub enabled: bool,
    /// Files created more than this many days ago are eligible for deletion.
    #[serde(default = "default_retention_days")]
    pub retention_days: u32,
    /// Maximum rows deleted per run, bounding transaction length.
    #[serde(default = "default_batch_limit")]
    pub batch_limit: u32,
    /// Hour (UTC) of the daily fire instant.
    #[serde(default = "default_fire_hour")]
    pub fire_hour: u8,
    /// Minute of the daily fire instant.
    #[serde(default = "default_fire_minute")]
    pub fire_minute: u8,
    /// Leader lock acquisition attempts per fire before abandoning the run.
    #[serde(default = "default_lock_attempts")]
    pub lock_attempts: u32,
}

fn default_scavenger_enabled() -> bool {
    true
}

fn default_retention_days() -> u32 {
    3
}

fn default_batch_limit() -> u32 {
    100
}

fn default_fire_hour() -> u8 {
    23
}

fn default_fire_minute() -> u8 {
    59
}

fn default_lock_attempts() -> u32 {
    3
}

impl Default for ScavengerConfig {
    fn default() -> Self {
        Self {
            enabled: default_scavenger_enabled(),
            retention_days: default_retention_days(),
            batch_limit: default_batch_limit(),
            fire_hour: default_fire_hour(),
            fire_minute: default_fire_minute(),
            lock_attempts: default_lock_attempts(),
        }
    }
}

/// Object storage (signed URL) configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Local deterministic URLs for development and tests.
    Local {
        #[serde(default = "default_local_base_url")]
        base_url: String,
    },
    /// S3 pre-signed URLs.
    S3 {
        /// AWS region.
        region: Option<String>,
        /// Optional endpoint URL (for MinIO, LocalStack, etc.).
        endpoint: Option<String>,
        /// Signed URL validity in seconds.
        #[serde(default = "default_url_expiry_secs")]
        url_expiry_secs: u64,
    },
}

fn default_local_base_url() -> String {
    "http://localhost:9000".to_string()
}

fn default_url_expiry_secs() -> u64 {
    15 * 60
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::Local {
            base_url: default_local_base_url(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testing_config_disables_background_components() {
        let config = AppConfig::for_testing();
        assert!(!config.cache.enabled);
        assert!(!config.notification.enabled);
        assert!(!config.scavenger.enabled);
        assert_eq!(config.buckets.names.len(), 2);
    }

    #[test]
    fn cache_url_includes_password_when_set() {
        let mut cache = CacheConfig::default();
        assert_eq!(cache.url(), "redis://127.0.0.1:6379/0");
        cache.password = Some("secret".to_string());
        assert_eq!(cache.url(), "redis://:secret@127.0.0.1:6379/0");
    }

    #[test]
    fn database_config_parses_tagged_form() {
        let config: DatabaseConfig = serde_json::from_value(serde_json::json!({
            "type": "postgres",
            "host": "db.internal",
            "database": "cabinet",
            "username": "cabinet",
        }))
        .unwrap();
        match config {
            DatabaseConfig::Postgres {
                port,
                max_connections,
                ..
            } => {
                assert_eq!(port, 5432);
                assert_eq!(max_connections, 10);
            }
            _ => panic!("expected postgres config"),
        }
    }
}
