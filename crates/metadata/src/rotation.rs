//! Round-robin bucket selection for new files.

use crate::error::{MetadataError, MetadataResult};
use crate::repos::BucketRepo;
use crate::store::MetadataStore;
use crossbeam_queue::ArrayQueue;

/// Hands out the storage bucket for each newly created file.
///
/// The working set is loaded once at initialization and is immutable for the
/// process lifetime; archiving a bucket only affects rotations built after
/// the next restart. With two or more active buckets, `next()` rotates
/// through them so concurrent file creation spreads evenly.
#[derive(Debug)]
pub struct BucketSelector {
    rotation: Rotation,
}

#[derive(Debug)]
enum Rotation {
    /// A single active bucket needs no rotation bookkeeping.
    Single(String),
    /// Lock-free rotate: pop the head, hand it out, re-enqueue it at the tail.
    RoundRobin(ArrayQueue<String>),
}

impl BucketSelector {
    /// Reconcile the configured bucket names into the bucket table and load
    /// the active rotation.
    ///
    /// Names already present are left untouched (duplicate inserts are
    /// ignored), so repeated startups and overlapping replica bootstraps are
    /// safe. Fails with `MetadataError::NoBuckets` if no non-archived bucket
    /// remains - the service cannot place new files without one.
    pub async fn initialize(
        store: &dyn MetadataStore,
        configured_names: &[String],
    ) -> MetadataResult<Self> {
        for name in configured_names {
            store.add_bucket_if_absent(name).await?;
        }

        let active = store.list_active_buckets().await?;
        tracing::info!(count = active.len(), "Loaded active buckets for rotation");

        match active.as_slice() {
            [] => Err(MetadataError::NoBuckets),
            [sole] => Ok(Self {
                rotation: Rotation::Single(sole.bucket_name.clone()),
            }),
            buckets => {
                let queue = ArrayQueue::new(buckets.len());
                for bucket in buckets {
                    // Capacity equals the bucket count, so these pushes cannot fail.
                    let _ = queue.push(bucket.bucket_name.clone());
                }
                Ok(Self {
                    rotation: Rotation::RoundRobin(queue),
                })
            }
        }
    }

    /// Number of buckets in the rotation.
    pub fn bucket_count(&self) -> usize {
        match &self.rotation {
            Rotation::Single(_) => 1,
            Rotation::RoundRobin(queue) => queue.capacity(),
        }
    }

    /// Get the bucket name to assign to the next created file.
    pub fn next(&self) -> String {
        match &self.rotation {
            Rotation::Single(name) => name.clone(),
            Rotation::RoundRobin(queue) => loop {
                match queue.pop() {
                    Some(name) => {
                        let selected = name.clone();
                        // Every pop is followed by a push and capacity matches
                        // the bucket count, so re-enqueueing cannot fail.
                        let _ = queue.push(name);
                        break selected;
                    }
                    // Transiently empty: more concurrent callers than buckets,
                    // all between pop and push. Their pushes land immediately.
                    None => std::hint::spin_loop(),
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use std::collections::HashSet;
    use std::sync::Arc;

    async fn store_with_buckets(names: &[&str]) -> SqliteStore {
        let store = SqliteStore::new(":memory:").await.unwrap();
        for name in names {
            store.add_bucket_if_absent(name).await.unwrap();
        }
        store
    }

    #[tokio::test]
    async fn zero_buckets_fails_initialization() {
        let store = SqliteStore::new(":memory:").await.unwrap();
        let err = BucketSelector::initialize(&store, &[]).await.unwrap_err();
        assert!(matches!(err, MetadataError::NoBuckets));
    }

    #[tokio::test]
    async fn sole_bucket_is_always_selected() {
        let store = store_with_buckets(&["only"]).await;
        let selector = BucketSelector::initialize(&store, &[]).await.unwrap();
        for _ in 0..5 {
            assert_eq!(selector.next(), "only");
        }
    }

    #[tokio::test]
    async fn rotation_is_fair_over_consecutive_windows() {
        let store = store_with_buckets(&["b1", "b2", "b3"]).await;
        let selector = BucketSelector::initialize(&store, &[]).await.unwrap();

        // Each bucket must appear exactly once in every window of three calls.
        for _ in 0..4 {
            let window: HashSet<String> = (0..3).map(|_| selector.next()).collect();
            assert_eq!(window.len(), 3);
        }
    }

    #[tokio::test]
    async fn archived_buckets_are_excluded() {
        let store = store_with_buckets(&["live", "old"]).await;
        store.archive_bucket("old").await.unwrap();
        let selector = BucketSelector::initialize(&store, &[]).await.unwrap();
        assert_eq!(selector.bucket_count(), 1);
        assert_eq!(selector.next(), "live");
    }

    #[tokio::test]
    async fn initialization_reconciles_configured_names() {
        let store = SqliteStore::new(":memory:").await.unwrap();
        let names = vec!["c1".to_string(), "c2".to_string()];
        let selector = BucketSelector::initialize(&store, &names).await.unwrap();
        assert_eq!(selector.bucket_count(), 2);

        // Re-initializing with overlapping names is benign.
        let selector = BucketSelector::initialize(&store, &names).await.unwrap();
        assert_eq!(selector.bucket_count(), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_callers_never_lose_buckets() {
        let store = store_with_buckets(&["b1", "b2", "b3"]).await;
        let selector = Arc::new(BucketSelector::initialize(&store, &[]).await.unwrap());

        let mut handles = Vec::new();
        for _ in 0..4 {
            let selector = selector.clone();
            handles.push(tokio::spawn(async move {
                for _ in 0..250 {
                    let name = selector.next();
                    assert!(name.starts_with('b'));
                }
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        // All three buckets are still in rotation afterwards.
        let window: HashSet<String> = (0..3).map(|_| selector.next()).collect();
        assert_eq!(window.len(), 3);
    }
}
