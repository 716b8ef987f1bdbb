//! In-memory key-value backend.
//!
//! Used by tests and by single-replica deployments that run with the cache
//! disabled. Expiry is lazy: expired entries are dropped when next touched.

use crate::error::CacheResult;
use crate::traits::KeyValueStore;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// Process-local key-value store.
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn live_value(entries: &mut HashMap<String, Entry>, key: &str) -> Option<String> {
        match entries.get(key) {
            Some(entry) if entry.is_expired() => {
                entries.remove(key);
                None
            }
            Some(entry) => Some(entry.value.clone()),
            None => None,
        }
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn get(&self, key: &str) -> CacheResult<Option<String>> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        Ok(Self::live_value(&mut entries, key))
    }

    async fn set_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(())
    }

    async fn delete(&self, key: &str) -> CacheResult<()> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.remove(key);
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str, ttl: Duration) -> CacheResult<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        if Self::live_value(&mut entries, key).is_some() {
            return Ok(false);
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Instant::now().checked_add(ttl),
            },
        );
        Ok(true)
    }

    async fn compare_and_delete(&self, key: &str, value: &str) -> CacheResult<bool> {
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match Self::live_value(&mut entries, key) {
            Some(current) if current == value => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn ping(&self) -> CacheResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_if_absent_respects_existing_value() {
        let store = MemoryStore::new();
        assert!(store
            .set_if_absent("k", "a", Duration::from_secs(60))
            .await
            .unwrap());
        assert!(!store
            .set_if_absent("k", "b", Duration::from_secs(60))
            .await
            .unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("a"));
    }

    #[tokio::test]
    async fn expired_entries_read_as_absent() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "v", Duration::from_millis(20))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert_eq!(store.get("k").await.unwrap(), None);
        // And the slot is reusable.
        assert!(store
            .set_if_absent("k", "w", Duration::from_secs(60))
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn compare_and_delete_requires_matching_value() {
        let store = MemoryStore::new();
        store
            .set_with_ttl("k", "mine", Duration::from_secs(60))
            .await
            .unwrap();
        assert!(!store.compare_and_delete("k", "theirs").await.unwrap());
        assert_eq!(store.get("k").await.unwrap().as_deref(), Some("mine"));
        assert!(store.compare_and_delete("k", "mine").await.unwrap());
        assert_eq!(store.get("k").await.unwrap(), None);
    }
}
