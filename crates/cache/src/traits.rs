//! Key-value store trait definition.

use crate::error::CacheResult;
use async_trait::async_trait;
use std::time::Duration;

/// Key-value store abstraction for caching and cluster coordination.
///
/// Two of these operations carry the coordination load and must be atomic in
/// the backend: `set_if_absent` (set-if-not-exists with expiry) and
/// `compare_and_delete` (delete only while holding the expected value). Any
/// store offering those two primitives can back the leader lock.
#[async_trait]
pub trait KeyValueStore: Send + Sync + 'static {
    /// Get a value. `Ok(None)` means the key is absent or expired.
    async fn get(&self, key: &str) -> CacheResult<Option<String>>;

    /// Set a value with a time-to-live.
    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()>;

    /// Delete a key. Deleting an absent key is not an error.
    async fn delete(&self, key: &str) -> CacheResult<()>;

    /// Atomically set the key only if it does not exist, with a time-to-live.
    /// Returns whether the key was set.
    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool>;

    /// Atomically delete the key only if it currently holds `value`.
    /// Returns whether the key was deleted.
    async fn compare_and_delete(&self, key: &str, value: &str) -> CacheResult<bool>;

    /// Verify backend connectivity.
    async fn ping(&self) -> CacheResult<()>;
}
