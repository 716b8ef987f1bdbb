//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{BucketRow, FileRow, NewFile};
use crate::repos::{BucketRepo, FileRepo, ScavengeRepo};
use async_trait::async_trait;
use cabinet_core::FileStatus;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;

/// SQLite schema (embedded).
const SQLITE_SCHEMA: &str = include_str!("sqlite_schema.sql");

/// Split an embedded schema into executable statements, dropping
/// comment-only fragments.
pub(crate) fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

/// Map unique-constraint violations on file inserts to `AlreadyExists` so
/// the API can reject duplicates instead of reporting an internal error.
pub(crate) fn reject_duplicate(err: sqlx::Error, name: &str) -> MetadataError {
    let err = MetadataError::from(err);
    if err.is_unique_violation() {
        MetadataError::AlreadyExists(format!("file {name}"))
    } else {
        err
    }
}

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore: FileRepo + BucketRepo + ScavengeRepo + Send + Sync {
    /// Apply the embedded schema.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
///
/// Intended for tests and single-node deployments; multi-replica deployments
/// need PostgreSQL for cross-process linearization of file updates.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store, creating the file and schema as needed.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| MetadataError::Config(format!("create database directory: {e}")))?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under test and
            // axum concurrency.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in schema_statements(SQLITE_SCHEMA) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

#[async_trait]
impl FileRepo for SqliteStore {
    async fn create_file(&self, file: &NewFile) -> MetadataResult<FileRow> {
        let now = OffsetDateTime::now_utc();
        let row = sqlx::query_as::<_, FileRow>(
            r#"
            INSERT INTO files (tenant_id, device_id, name, checksum, size, status, bucket_name, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING file_id, tenant_id, device_id, name, checksum, size, status, bucket_name, created_at, updated_at
            "#,
        )
        .bind(&file.tenant_id)
        .bind(&file.device_id)
        .bind(&file.name)
        .bind(&file.checksum)
        .bind(file.size)
        .bind(FileStatus::New.as_str())
        .bind(&file.bucket_name)
        .bind(now)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| reject_duplicate(e, &file.name))?;
        Ok(row)
    }

    async fn get_file(&self, file_id: i64) -> MetadataResult<Option<FileRow>> {
        let row = sqlx::query_as::<_, FileRow>("SELECT * FROM files WHERE file_id = $1")
            .bind(file_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_files(&self, tenant_id: &str, device_id: &str) -> MetadataResult<Vec<FileRow>> {
        let rows = sqlx::query_as::<_, FileRow>(
            "SELECT * FROM files WHERE tenant_id = $1 AND device_id = $2 ORDER BY file_id",
        )
        .bind(tenant_id)
        .bind(device_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_file_status(
        &self,
        file_id: i64,
        status: FileStatus,
        size: i64,
    ) -> MetadataResult<()> {
        let updated: Option<i64> = sqlx::query_scalar(
            "UPDATE files SET status = $2, size = $3, updated_at = $4 WHERE file_id = $1 RETURNING file_id",
        )
        .bind(file_id)
        .bind(status.as_str())
        .bind(size)
        .bind(OffsetDateTime::now_utc())
        .fetch_optional(&self.pool)
        .await?;

        match updated {
            Some(_) => Ok(()),
            None => Err(MetadataError::NotFound(format!("file {file_id}"))),
        }
    }

    async fn delete_file(&self, file_id: i64) -> MetadataResult<()> {
        let result = sqlx::query("DELETE FROM files WHERE file_id = $1")
            .bind(file_id)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("file {file_id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl BucketRepo for SqliteStore {
    async fn add_bucket_if_absent(&self, bucket_name: &str) -> MetadataResult<()> {
        let now = OffsetDateTime::now_utc();
        sqlx::query(
            r#"
            INSERT INTO buckets (bucket_name, is_archived, created_at, updated_at)
            VALUES ($1, FALSE, $2, $3)
            ON CONFLICT (bucket_name) DO NOTHING
            "#,
        )
        .bind(bucket_name)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_bucket(&self, bucket_name: &str) -> MetadataResult<Option<BucketRow>> {
        let row = sqlx::query_as::<_, BucketRow>("SELECT * FROM buckets WHERE bucket_name = $1")
            .bind(bucket_name)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_active_buckets(&self) -> MetadataResult<Vec<BucketRow>> {
        let rows = sqlx::query_as::<_, BucketRow>(
            "SELECT * FROM buckets WHERE is_archived = FALSE ORDER BY bucket_name",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn archive_bucket(&self, bucket_name: &str) -> MetadataResult<()> {
        let result =
            sqlx::query("UPDATE buckets SET is_archived = TRUE, updated_at = $2 WHERE bucket_name = $1")
                .bind(bucket_name)
                .bind(OffsetDateTime::now_utc())
                .execute(&self.pool)
                .await?;
        if result.rows_affected() == 0 {
            return Err(MetadataError::NotFound(format!("bucket {bucket_name}")));
        }
        Ok(())
    }
}

#[async_trait]
impl ScavengeRepo for SqliteStore {
    async fn delete_files_created_before(
        &self,
        cutoff: OffsetDateTime,
        limit: u32,
    ) -> MetadataResult<u64> {
        // Bounded via a subquery: neither backend supports DELETE .. LIMIT
        // portably, and ordering by file_id keeps repeated runs deterministic.
        let result = sqlx::query(
            r#"
            DELETE FROM files WHERE file_id IN (
                SELECT file_id FROM files WHERE created_at <= $1 ORDER BY file_id LIMIT $2
            )
            "#,
        )
        .bind(cutoff)
        .bind(i64::from(limit))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}
