//! Database models mapping to the metadata schema.

use sqlx::FromRow;
use time::OffsetDateTime;

/// File record.
///
/// Owned by the relational store; the service never mutates `status` outside
/// the `new -> uploaded | quarantined` transitions. The same struct is the
/// snapshot shape stored in the file cache, hence the serde derives.
#[derive(Debug, Clone, PartialEq, FromRow, serde::Serialize, serde::Deserialize)]
pub struct FileRow {
    /// Service-assigned identity, monotonically increasing.
    pub file_id: i64,
    pub tenant_id: String,
    pub device_id: String,
    pub name: String,
    pub checksum: String,
    pub size: i64,
    pub status: String,
    /// Bucket the file was assigned to at creation.
    pub bucket_name: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// Storage bucket record.
///
/// Archived buckets are excluded from new-file assignment but remain
/// readable for files already placed in them.
#[derive(Debug, Clone, FromRow)]
pub struct BucketRow {
    pub bucket_name: String,
    pub is_archived: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields supplied by the caller when creating a file row.
#[derive(Debug, Clone)]
pub struct NewFile {
    pub tenant_id: String,
    pub device_id: String,
    pub name: String,
    pub checksum: String,
    pub size: i64,
    pub bucket_name: String,
}
