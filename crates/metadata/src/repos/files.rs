//! File repository.

use crate::error::MetadataResult;
use crate::models::{FileRow, NewFile};
use async_trait::async_trait;
use cabinet_core::FileStatus;

/// Repository for file row operations.
///
/// All single-row writes go through the store's transactional read-modify-write,
/// which is what linearizes concurrent updates to one file identity.
#[async_trait]
pub trait FileRepo: Send + Sync {
    /// Insert a new file row with status `new`, returning the full row
    /// including the server-assigned identity.
    async fn create_file(&self, file: &NewFile) -> MetadataResult<FileRow>;

    /// Get a file by identity.
    async fn get_file(&self, file_id: i64) -> MetadataResult<Option<FileRow>>;

    /// List all files belonging to one device within one tenant.
    async fn list_files(&self, tenant_id: &str, device_id: &str) -> MetadataResult<Vec<FileRow>>;

    /// Set a file's status and size.
    ///
    /// Idempotent under redelivery: re-applying the same (status, size) pair
    /// leaves the row unchanged apart from `updated_at`. Returns
    /// `MetadataError::NotFound` if the identity does not exist - callers
    /// must not treat that as success.
    async fn update_file_status(
        &self,
        file_id: i64,
        status: FileStatus,
        size: i64,
    ) -> MetadataResult<()>;

    /// Delete a file row outright. Returns `MetadataError::NotFound` if the
    /// identity does not exist.
    async fn delete_file(&self, file_id: i64) -> MetadataResult<()>;
}
