//! PostgreSQL-based metadata store implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{BucketRow, FileRow, NewFile};
use crate::repos::{BucketRepo, FileRepo, ScavengeRepo};
use crate::store::{reject_duplicate, schema_statements, MetadataStore};
use async_trait::async_trait;
use cabinet_core::FileStatus;
use sqlx::postgres::{PgConnectOptions, PgPoolOptions};
use sqlx::{Pool, Postgres};
use time::OffsetDateTime;

/// PostgreSQL schema (embedded).
const POSTGRES_SCHEMA: &str = include_str!("postgres_schema.sql");

/// PostgreSQL-based metadata store.
pub struct PostgresStore {
    pool: Pool<Postgres>,
}

impl PostgresStore {
    /// Create a new PostgreSQL store from a connection URL.
    pub async fn from_url(
        url: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        use std::str::FromStr;
        let opts = PgConnectOptions::from_str(url)?;
        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Create a new PostgreSQL store from individual connection parameters.
    ///
    /// This allows credentials to be passed separately, enabling better
    /// secret management (e.g., passwords via environment variables).
    pub async fn from_params(
        host: &str,
        port: u16,
        username: Option<&str>,
        password: Option<&str>,
        database: &str,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        let mut opts = PgConnectOptions::new()
            .host(host)
            .port(port)
            .database(database);

        if let Some(user) = username {
            opts = opts.username(user);
        }

        if let Some(pass) = password {
            opts = opts.password(pass);
        }

        // Log connection info without password
        tracing::info!(
            host = host,
            port = port,
            database = database,
            username = username.unwrap_or("<none>"),
            "Connecting to PostgreSQL"
        );

        Self::connect(opts, max_connections, statement_timeout_ms).await
    }

    /// Internal: Connect to PostgreSQL with the given options.
    async fn connect(
        mut opts: PgConnectOptions,
        max_connections: u32,
        statement_timeout_ms: Option<u64>,
    ) -> MetadataResult<Self> {
        // Bound hung queries; the scavenger's batch delete in particular must
        // never hold a transaction open indefinitely.
        if let Some(timeout_ms) = statement_timeout_ms {
            opts = opts.options([("statement_timeout", format!("{}ms", timeout_ms))]);
            tracing::info!("PostgreSQL statement_timeout set to {}ms", timeout_ms);
        }

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;

        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Postgres> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for PostgresStore {
    async fn migrate(&self) -> MetadataResult<()> {
        // PostgreSQL doesn't allow multiple statements in a single prepared
        // statement, so the schema is split and executed one at a time.
        for statement in schema_statements(POSTGRES_SCHEMA) {
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
impl FileRepo for PostgresStore {
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
impl BucketRepo for PostgresStore {
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
impl ScavengeRepo for PostgresStore {
    async fn delete_files_created_before(
        &self,
        cutoff: OffsetDateTime,
        limit: u32,
    ) -> MetadataResult<u64> {
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
