//! Health check handler.

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;
use axum::extract::State;
use axum::Json;
use cabinet_metadata::MetadataStore;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health - liveness/readiness probe.
///
/// Only the authoritative store gates health: the cache and the notification
/// queue are fail-open or retried and must not take the service out of
/// rotation.
pub async fn health_check(State(state): State<AppState>) -> ApiResult<Json<HealthResponse>> {
    state
        .metadata
        .health_check()
        .await
        .map_err(|e| ApiError::Internal(format!("database health check failed: {e}")))?;

    Ok(Json(HealthResponse { status: "ok" }))
}
