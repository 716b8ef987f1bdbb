//! Cluster-wide leader lock.

use crate::traits::KeyValueStore;
use rand::Rng;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Length of the random token written to the lock key. The token is what lets
/// a replica recognize its own lock before releasing it.
const TOKEN_LENGTH: usize = 10;

/// Distributed mutual exclusion over a shared key-value store.
///
/// Holding the lock means this replica wrote its token to the well-known key
/// and the key has not yet expired. The lifetime is deliberately short
/// relative to the gated job's tolerance: a crashed leader locks everyone out
/// for at most one lifetime instead of forever.
pub struct LeaderLock {
    kv: Arc<dyn KeyValueStore>,
    key: String,
    ttl: Duration,
    token: OnceLock<String>,
}

fn new_lock_token() -> String {
    rand::rng()
        .sample_iter(rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect::<String>()
        .to_lowercase()
}

impl LeaderLock {
    /// Create a lock handle over the given store and key.
    pub fn new(kv: Arc<dyn KeyValueStore>, key: impl Into<String>, ttl: Duration) -> Self {
        Self {
            kv,
            key: key.into(),
            ttl,
            token: OnceLock::new(),
        }
    }

    /// The lock's lifetime. A failed acquisition cannot succeed again until
    /// the holder releases or this much time passes, so retry waits should
    /// use this value.
    pub fn lifetime(&self) -> Duration {
        self.ttl
    }

    /// Token identifying this replica, generated on first use and reused for
    /// the process lifetime.
    fn token(&self) -> &str {
        self.token.get_or_init(new_lock_token)
    }

    /// Try to become leader.
    ///
    /// Returns `true` when this replica now holds the lock until it releases
    /// or the lifetime elapses. `false` means another replica is leader (or
    /// the store was unreachable) and the caller must not run the gated job.
    pub async fn acquire(&self) -> bool {
        match self.kv.set_if_absent(&self.key, self.token(), self.ttl).await {
            Ok(true) => true,
            Ok(false) => {
                tracing::debug!(key = %self.key, "Leader lock is held by another replica");
                false
            }
            Err(error) => {
                tracing::error!(key = %self.key, %error, "Failed to acquire the leader lock");
                false
            }
        }
    }

    /// Release the lock if this replica still holds it.
    ///
    /// The compare-and-delete is a single atomic operation in the store: if
    /// our token expired and another replica acquired the key in the
    /// meantime, their lock is left untouched.
    pub async fn release(&self) {
        match self.kv.compare_and_delete(&self.key, self.token()).await {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(
                    key = %self.key,
                    "Leader lock was not held by this replica at release"
                );
            }
            Err(error) => {
                tracing::error!(key = %self.key, %error, "Failed to release the leader lock");
            }
        }
    }
}
