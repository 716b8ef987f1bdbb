//! File cache and cluster coordination primitives for Cabinet.
//!
//! Two consumers share one key-value store:
//! - [`FileCache`]: fail-open snapshots of file rows in front of the
//!   metadata store
//! - [`LeaderLock`]: cluster-wide mutual exclusion for the retention
//!   scavenger

pub mod backends;
pub mod error;
pub mod file_cache;
pub mod lock;
pub mod metrics;
pub mod traits;

pub use backends::{MemoryStore, RedisStore};
pub use error::{CacheError, CacheResult};
pub use file_cache::FileCache;
pub use lock::LeaderLock;
pub use traits::KeyValueStore;

use cabinet_core::config::CacheConfig;
use std::sync::Arc;

/// Create the file cache and leader lock from configuration.
///
/// With the cache disabled the file cache is inert and the lock degrades to a
/// process-local store - safe only for single-replica deployments. With the
/// cache enabled, a failure to reach Redis here is fatal so misconfiguration
/// surfaces at startup rather than as a permanently cold cache.
pub async fn from_config(config: &CacheConfig) -> CacheResult<(FileCache, LeaderLock)> {
    if !config.enabled {
        tracing::info!("Caching is disabled; leader lock is process-local");
        let kv: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
        return Ok((
            FileCache::disabled(),
            LeaderLock::new(kv, config.lock_key.clone(), config.lock_ttl()),
        ));
    }

    let store = RedisStore::connect(&config.url()).await?;
    store.ping().await?;
    tracing::info!(host = %config.host, port = config.port, "Connected to the file cache");

    let kv: Arc<dyn KeyValueStore> = Arc::new(store);
    Ok((
        FileCache::new(kv.clone(), config.file_ttl()),
        LeaderLock::new(kv, config.lock_key.clone(), config.lock_ttl()),
    ))
}
