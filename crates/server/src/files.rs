//! Read-through, write-invalidate composition of the metadata store and the
//! file cache.

use cabinet_cache::FileCache;
use cabinet_metadata::models::{FileRow, NewFile};
use cabinet_metadata::repos::FileRepo;
use cabinet_metadata::{MetadataResult, MetadataStore};
use std::sync::Arc;

/// File operations as the handlers and background tasks see them.
///
/// Cache population and invalidation always happen on spawned tasks so they
/// can neither delay a request nor affect its result; the cache is fail-open
/// underneath, so a lost spawn only costs a future cache miss.
#[derive(Clone)]
pub struct FileService {
    metadata: Arc<dyn MetadataStore>,
    cache: FileCache,
}

impl FileService {
    pub fn new(metadata: Arc<dyn MetadataStore>, cache: FileCache) -> Self {
        Self { metadata, cache }
    }

    /// Create a file row and populate the cache asynchronously.
    pub async fn create(&self, new_file: &NewFile) -> MetadataResult<FileRow> {
        let row = self.metadata.create_file(new_file).await?;

        let cache = self.cache.clone();
        let snapshot = row.clone();
        tokio::spawn(async move {
            cache.put(snapshot.file_id, &snapshot).await;
        });

        Ok(row)
    }

    /// Look up a file, serving from the cache when possible and repopulating
    /// it from the authoritative store on a miss.
    pub async fn get(&self, file_id: i64) -> MetadataResult<Option<FileRow>> {
        if let Some(row) = self.cache.get::<FileRow>(file_id).await {
            tracing::debug!(file_id, "File lookup served from cache");
            return Ok(Some(row));
        }

        let Some(row) = self.metadata.get_file(file_id).await? else {
            return Ok(None);
        };

        let cache = self.cache.clone();
        let snapshot = row.clone();
        tokio::spawn(async move {
            cache.put(snapshot.file_id, &snapshot).await;
        });

        Ok(Some(row))
    }

    /// List all files for one tenant/device pair.
    pub async fn list(&self, tenant_id: &str, device_id: &str) -> MetadataResult<Vec<FileRow>> {
        self.metadata.list_files(tenant_id, device_id).await
    }

    /// Delete a file row and invalidate its cache entry asynchronously.
    pub async fn delete(&self, file_id: i64) -> MetadataResult<()> {
        self.metadata.delete_file(file_id).await?;

        let cache = self.cache.clone();
        tokio::spawn(async move {
            cache.remove(file_id).await;
        });

        Ok(())
    }
}
