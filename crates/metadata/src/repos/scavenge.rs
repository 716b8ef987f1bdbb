//! Retention scavenging repository.

use crate::error::MetadataResult;
use async_trait::async_trait;
use time::OffsetDateTime;

/// Repository for the retention scavenger's bounded deletes.
#[async_trait]
pub trait ScavengeRepo: Send + Sync {
    /// Delete up to `limit` file rows created at or before `cutoff`,
    /// returning how many were deleted. The bound keeps each invocation's
    /// transaction short; the scavenger reruns daily, so the backlog drains
    /// across runs.
    async fn delete_files_created_before(
        &self,
        cutoff: OffsetDateTime,
        limit: u32,
    ) -> MetadataResult<u64>;
}
