//! S3 pre-signed URL provider using the AWS SDK.

use crate::error::{StorageError, StorageResult};
use crate::traits::{SignedUrlProvider, UrlMethod};
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::Client;
use cabinet_core::ObjectKey;
use std::time::Duration;

/// S3-backed signed URL provider.
pub struct S3Provider {
    client: Client,
    expiry: Duration,
}

impl S3Provider {
    /// Build a provider from the ambient AWS configuration, with optional
    /// region and endpoint overrides (MinIO, LocalStack).
    pub async fn connect(
        region: Option<&str>,
        endpoint: Option<&str>,
        expiry: Duration,
    ) -> StorageResult<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region.to_string()));
        }
        let shared = loader.load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared);
        if let Some(endpoint) = endpoint {
            // Path-style addressing so custom endpoints don't need per-bucket DNS.
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }
        let client = Client::from_conf(builder.build());

        tracing::info!(region = ?region, endpoint = ?endpoint, "Initialized S3 signed URL provider");

        Ok(Self { client, expiry })
    }

    fn presigning_config(&self) -> StorageResult<PresigningConfig> {
        PresigningConfig::expires_in(self.expiry)
            .map_err(|e| StorageError::Config(format!("invalid presign expiry: {e}")))
    }
}

#[async_trait]
impl SignedUrlProvider for S3Provider {
    async fn signed_url(
        &self,
        bucket: &str,
        key: &ObjectKey,
        method: UrlMethod,
    ) -> StorageResult<String> {
        let config = self.presigning_config()?;
        let object_key = key.to_string();

        let presigned = match method {
            UrlMethod::Get => self
                .client
                .get_object()
                .bucket(bucket)
                .key(&object_key)
                .presigned(config)
                .await
                .map_err(|e| StorageError::Backend(format!("presign GET: {e}")))?,
            UrlMethod::Put => self
                .client
                .put_object()
                .bucket(bucket)
                .key(&object_key)
                .presigned(config)
                .await
                .map_err(|e| StorageError::Backend(format!("presign PUT: {e}")))?,
            UrlMethod::Head => self
                .client
                .head_object()
                .bucket(bucket)
                .key(&object_key)
                .presigned(config)
                .await
                .map_err(|e| StorageError::Backend(format!("presign HEAD: {e}")))?,
        };

        Ok(presigned.uri().to_string())
    }
}
