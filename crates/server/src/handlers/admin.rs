//! Internal administrative handlers.

use crate::error::ApiResult;
use crate::scavenger;
use crate::state::AppState;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use cabinet_metadata::repos::BucketRepo;

/// POST /api/internal/v1/scavenger - run one bounded deletion pass now.
///
/// The manual path skips leader election: the operator addressed this
/// replica. The deletion itself is idempotent and bounded either way.
pub async fn run_scavenger(State(state): State<AppState>) -> StatusCode {
    tracing::info!("Received a request to run the scavenger");

    let metadata = state.metadata.clone();
    let config = state.config.scavenger.clone();
    tokio::spawn(async move {
        if let Err(error) = scavenger::sweep(metadata.as_ref(), &config).await {
            tracing::error!(%error, "Manually triggered scavenger run failed");
            crate::metrics::SCAVENGER_RUN_FAILURES.inc();
        }
    });

    StatusCode::ACCEPTED
}

/// POST /api/internal/v1/buckets/{name}/archive - exclude a bucket from
/// future rotations.
///
/// The running rotation is immutable; the change takes effect at the next
/// restart of each replica.
pub async fn archive_bucket(
    State(state): State<AppState>,
    Path(bucket_name): Path<String>,
) -> ApiResult<StatusCode> {
    state.metadata.archive_bucket(&bucket_name).await?;
    tracing::info!(bucket = %bucket_name, "Bucket archived; rotation updates at next restart");
    Ok(StatusCode::NO_CONTENT)
}
