//! Server test utilities.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use cabinet_cache::{FileCache, MemoryStore};
use cabinet_core::config::AppConfig;
use cabinet_metadata::{BucketSelector, MetadataStore, SqliteStore};
use cabinet_server::{create_router, AppState};
use cabinet_storage::{LocalProvider, SignedUrlProvider};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

/// A test server wrapper with all dependencies in-process.
/// Note: #[allow(dead_code)] because each test file compiles common/ separately.
#[allow(dead_code)]
pub struct TestServer {
    pub router: axum::Router,
    pub state: AppState,
    pub metadata: Arc<SqliteStore>,
    pub cache: FileCache,
    pub cache_kv: Arc<MemoryStore>,
}

#[allow(dead_code)]
impl TestServer {
    /// Create a new test server over in-memory SQLite, an in-memory cache
    /// backend, and the local signed URL provider.
    pub async fn new() -> Self {
        let config = AppConfig::for_testing();

        let metadata = Arc::new(
            SqliteStore::new(":memory:")
                .await
                .expect("Failed to create metadata store"),
        );

        let cache_kv = Arc::new(MemoryStore::new());
        let cache = FileCache::new(cache_kv.clone(), Duration::from_secs(3600));

        let buckets = Arc::new(
            BucketSelector::initialize(metadata.as_ref(), &config.buckets.names)
                .await
                .expect("Failed to initialize bucket rotation"),
        );

        let storage: Arc<dyn SignedUrlProvider> =
            Arc::new(LocalProvider::new("http://localhost:9000"));

        let state = AppState::new(
            config,
            metadata.clone() as Arc<dyn MetadataStore>,
            cache.clone(),
            storage,
            buckets,
        );
        let router = create_router(state.clone());

        Self {
            router,
            state,
            metadata,
            cache,
            cache_kv,
        }
    }

    /// Make a JSON request against the router.
    pub async fn request(
        &self,
        method: &str,
        uri: &str,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = match body {
            Some(v) => {
                builder = builder.header("Content-Type", "application/json");
                Body::from(serde_json::to_vec(&v).expect("serialize request body"))
            }
            None => Body::empty(),
        };

        let request = builder.body(body).expect("build request");
        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("dispatch request");

        let status = response.status();
        let body_bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");

        let json: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes).unwrap_or(Value::Null)
        };

        (status, json)
    }
}

/// Tenant/device identifiers that pass request validation.
#[allow(dead_code)]
pub const TENANT_1: &str = "fe6671ca-78de-4b19-9cd1-9e5247c2379e";
#[allow(dead_code)]
pub const DEVICE_1: &str = "f10348dd-e57d-47bf-8f35-b2b02ea23ec2";

/// Payload for a valid create-file request.
#[allow(dead_code)]
pub fn create_file_body(name: &str, checksum: &str, size: i64) -> Value {
    serde_json::json!({
        "tenant_id": TENANT_1,
        "device_id": DEVICE_1,
        "name": name,
        "checksum": checksum,
        "size": size,
    })
}
