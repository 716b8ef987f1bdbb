//! Fail-open cache of file metadata snapshots.

use crate::metrics;
use crate::traits::KeyValueStore;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Read-through, write-invalidate cache in front of the metadata store.
///
/// The cache is strictly an optimization and never a correctness dependency:
/// every backend failure is logged, counted, and swallowed. Entries are only
/// ever written after an authoritative read or create and only ever *deleted*
/// on writes - there is no in-place update, so a surviving entry can never be
/// older than the last committed write its invalidator knew about.
#[derive(Clone)]
pub struct FileCache {
    inner: Option<Inner>,
}

#[derive(Clone)]
struct Inner {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

fn file_key(file_id: i64) -> String {
    format!("file:{file_id}")
}

impl FileCache {
    /// Create a cache over the given backend with a fixed entry TTL.
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self {
            inner: Some(Inner { kv, ttl }),
        }
    }

    /// Create a disabled cache: every operation is a no-op and every read is
    /// a miss.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Whether the cache is enabled.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Cache a snapshot of a file record.
    pub async fn put<T: Serialize>(&self, file_id: i64, record: &T) {
        let Some(inner) = &self.inner else { return };

        let snapshot = match serde_json::to_string(record) {
            Ok(snapshot) => snapshot,
            Err(error) => {
                tracing::error!(file_id, %error, "Failed to serialize file for caching");
                metrics::CACHE_SET_FAILURES.inc();
                return;
            }
        };

        let start = Instant::now();
        let result = inner
            .kv
            .set_with_ttl(&file_key(file_id), &snapshot, inner.ttl)
            .await;
        metrics::CACHE_LATENCY.observe(start.elapsed().as_secs_f64());

        if let Err(error) = result {
            tracing::error!(file_id, %error, "Failed to add file to the cache");
            metrics::CACHE_SET_FAILURES.inc();
        }
    }

    /// Look up a cached file snapshot. Any failure reads as a miss.
    pub async fn get<T: DeserializeOwned>(&self, file_id: i64) -> Option<T> {
        let inner = self.inner.as_ref()?;

        let start = Instant::now();
        let result = inner.kv.get(&file_key(file_id)).await;
        metrics::CACHE_LATENCY.observe(start.elapsed().as_secs_f64());

        let snapshot = match result {
            Ok(Some(snapshot)) => snapshot,
            Ok(None) => {
                metrics::CACHE_MISSES.inc();
                return None;
            }
            Err(error) => {
                tracing::error!(file_id, %error, "Error while looking up file in the cache");
                metrics::CACHE_GET_FAILURES.inc();
                return None;
            }
        };

        match serde_json::from_str(&snapshot) {
            Ok(record) => {
                metrics::CACHE_HITS.inc();
                Some(record)
            }
            Err(error) => {
                // A corrupt entry is dropped so the next read repopulates it.
                tracing::error!(file_id, %error, "Failed to deserialize cached file");
                metrics::CACHE_GET_FAILURES.inc();
                self.remove(file_id).await;
                None
            }
        }
    }

    /// Invalidate the cached snapshot for a file.
    pub async fn remove(&self, file_id: i64) {
        let Some(inner) = &self.inner else { return };

        let start = Instant::now();
        let result = inner.kv.delete(&file_key(file_id)).await;
        metrics::CACHE_LATENCY.observe(start.elapsed().as_secs_f64());

        if let Err(error) = result {
            tracing::error!(file_id, %error, "Failed to remove file from the cache");
            metrics::CACHE_DEL_FAILURES.inc();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::MemoryStore;
    use crate::error::{CacheError, CacheResult};
    use async_trait::async_trait;

    #[derive(serde::Serialize, serde::Deserialize, Debug, PartialEq, Clone)]
    struct Snapshot {
        file_id: i64,
        status: String,
    }

    fn sample(file_id: i64) -> Snapshot {
        Snapshot {
            file_id,
            status: "new".to_string(),
        }
    }

    fn memory_cache(ttl: Duration) -> FileCache {
        FileCache::new(Arc::new(MemoryStore::new()), ttl)
    }

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let cache = memory_cache(Duration::from_secs(60));
        cache.put(1, &sample(1)).await;
        let got: Option<Snapshot> = cache.get(1).await;
        assert_eq!(got, Some(sample(1)));
    }

    #[tokio::test]
    async fn remove_makes_subsequent_get_a_miss() {
        let cache = memory_cache(Duration::from_secs(60));
        cache.put(1, &sample(1)).await;
        cache.remove(1).await;
        let got: Option<Snapshot> = cache.get(1).await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = memory_cache(Duration::from_millis(20));
        cache.put(1, &sample(1)).await;
        tokio::time::sleep(Duration::from_millis(40)).await;
        let got: Option<Snapshot> = cache.get(1).await;
        assert_eq!(got, None);
    }

    #[tokio::test]
    async fn disabled_cache_is_inert() {
        let cache = FileCache::disabled();
        cache.put(1, &sample(1)).await;
        let got: Option<Snapshot> = cache.get(1).await;
        assert_eq!(got, None);
        cache.remove(1).await;
    }

    /// Backend that fails every operation; the cache must swallow all of it.
    struct BrokenStore;

    #[async_trait]
    impl KeyValueStore for BrokenStore {
        async fn get(&self, _key: &str) -> CacheResult<Option<String>> {
            Err(CacheError::Backend("down".into()))
        }
        async fn set_with_ttl(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> CacheResult<()> {
            Err(CacheError::Backend("down".into()))
        }
        async fn delete(&self, _key: &str) -> CacheResult<()> {
            Err(CacheError::Backend("down".into()))
        }
        async fn set_if_absent(
            &self,
            _key: &str,
            _value: &str,
            _ttl: Duration,
        ) -> CacheResult<bool> {
            Err(CacheError::Backend("down".into()))
        }
        async fn compare_and_delete(&self, _key: &str, _value: &str) -> CacheResult<bool> {
            Err(CacheError::Backend("down".into()))
        }
        async fn ping(&self) -> CacheResult<()> {
            Err(CacheError::Backend("down".into()))
        }
    }

    #[tokio::test]
    async fn backend_failures_are_swallowed() {
        let cache = FileCache::new(Arc::new(BrokenStore), Duration::from_secs(60));
        cache.put(1, &sample(1)).await;
        let got: Option<Snapshot> = cache.get(1).await;
        assert_eq!(got, None);
        cache.remove(1).await;
    }
}
