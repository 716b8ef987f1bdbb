//! Bucket repository.

use crate::error::MetadataResult;
use crate::models::BucketRow;
use async_trait::async_trait;

/// Repository for storage bucket operations.
#[async_trait]
pub trait BucketRepo: Send + Sync {
    /// Insert a bucket if it is not already present. Duplicate names are
    /// ignored, which makes startup reconciliation safe to repeat.
    async fn add_bucket_if_absent(&self, bucket_name: &str) -> MetadataResult<()>;

    /// Get a bucket by name.
    async fn get_bucket(&self, bucket_name: &str) -> MetadataResult<Option<BucketRow>>;

    /// List all non-archived buckets, ordered by name so every replica loads
    /// the same rotation.
    async fn list_active_buckets(&self) -> MetadataResult<Vec<BucketRow>>;

    /// Mark a bucket archived, excluding it from rotations built after the
    /// next restart. Returns `MetadataError::NotFound` for unknown names.
    async fn archive_bucket(&self, bucket_name: &str) -> MetadataResult<()>;
}
