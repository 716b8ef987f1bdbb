//! Object storage signed-URL providers for Cabinet.
//!
//! Clients never upload through this service; they get a pre-signed URL and
//! talk to object storage directly. The storage layer then notifies the
//! service of completed writes through the upload notification queue.

pub mod backends;
pub mod error;
pub mod traits;

pub use backends::{LocalProvider, S3Provider};
pub use error::{StorageError, StorageResult};
pub use traits::{SignedUrlProvider, UrlMethod};

use cabinet_core::config::StorageConfig;
use std::sync::Arc;
use std::time::Duration;

/// Create a signed URL provider from configuration.
pub async fn from_config(config: &StorageConfig) -> StorageResult<Arc<dyn SignedUrlProvider>> {
    match config {
        StorageConfig::Local { base_url } => {
            Ok(Arc::new(LocalProvider::new(base_url.clone())) as Arc<dyn SignedUrlProvider>)
        }
        StorageConfig::S3 {
            region,
            endpoint,
            url_expiry_secs,
        } => {
            let provider = S3Provider::connect(
                region.as_deref(),
                endpoint.as_deref(),
                Duration::from_secs(*url_expiry_secs),
            )
            .await?;
            Ok(Arc::new(provider) as Arc<dyn SignedUrlProvider>)
        }
    }
}
