//! Application state shared across handlers.

use crate::files::FileService;
use cabinet_cache::FileCache;
use cabinet_core::config::AppConfig;
use cabinet_metadata::{BucketSelector, MetadataStore};
use cabinet_storage::SignedUrlProvider;
use std::sync::Arc;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<AppConfig>,
    /// Authoritative metadata store.
    pub metadata: Arc<dyn MetadataStore>,
    /// Cache-composed file operations.
    pub files: FileService,
    /// Signed URL provider.
    pub storage: Arc<dyn SignedUrlProvider>,
    /// Bucket rotation for new files.
    pub buckets: Arc<BucketSelector>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(
        config: AppConfig,
        metadata: Arc<dyn MetadataStore>,
        cache: FileCache,
        storage: Arc<dyn SignedUrlProvider>,
        buckets: Arc<BucketSelector>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            files: FileService::new(metadata.clone(), cache),
            metadata,
            storage,
            buckets,
        }
    }
}
