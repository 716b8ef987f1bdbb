//! Deterministic signed URLs for development and tests.

use crate::error::StorageResult;
use crate::traits::{SignedUrlProvider, UrlMethod};
use async_trait::async_trait;
use cabinet_core::ObjectKey;

/// URL provider that fabricates stable URLs without talking to any backend.
///
/// The URLs grant nothing; they exist so the request path can be exercised
/// end-to-end against a local storage stack.
pub struct LocalProvider {
    base_url: String,
}

impl LocalProvider {
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        Self { base_url }
    }
}

#[async_trait]
impl SignedUrlProvider for LocalProvider {
    async fn signed_url(
        &self,
        bucket: &str,
        key: &ObjectKey,
        method: UrlMethod,
    ) -> StorageResult<String> {
        Ok(format!(
            "{}/{}/{}?method={}&signature=local",
            self.base_url,
            bucket,
            key,
            method.as_str()
        ))
    }
}
