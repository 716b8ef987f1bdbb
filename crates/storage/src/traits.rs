//! Storage trait definitions.
//!
//! The storage data plane is an external collaborator: clients upload and
//! download directly against object storage with URLs this service signs.
//! Only URL signing is abstracted here.

use crate::error::{StorageError, StorageResult};
use async_trait::async_trait;
use cabinet_core::ObjectKey;

/// HTTP method a signed URL grants.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UrlMethod {
    Get,
    Put,
    Head,
}

impl UrlMethod {
    /// Parse from the request's `method` parameter (case-insensitive).
    pub fn parse(s: &str) -> StorageResult<Self> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "PUT" => Ok(Self::Put),
            "HEAD" => Ok(Self::Head),
            _ => Err(StorageError::InvalidMethod(s.to_string())),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Head => "HEAD",
        }
    }
}

/// Produces pre-signed URLs against a file's storage object.
#[async_trait]
pub trait SignedUrlProvider: Send + Sync + 'static {
    /// Sign a URL for the given method on `bucket`/`key`.
    async fn signed_url(
        &self,
        bucket: &str,
        key: &ObjectKey,
        method: UrlMethod,
    ) -> StorageResult<String>;
}
