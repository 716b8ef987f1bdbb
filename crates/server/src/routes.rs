//! Route configuration.

use crate::handlers;
use crate::metrics::metrics_handler;
use crate::state::AppState;
use axum::routing::{delete, get, post};
use axum::Router;
use tower_http::trace::TraceLayer;

/// Create the application router.
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Health check (unauthenticated for load balancers/k8s probes)
        .route("/health", get(handlers::health_check))
        // External API (device facing)
        .route("/api/v1/files", post(handlers::create_file))
        .route("/api/v1/files/{id}", get(handlers::get_file))
        // Internal API (service facing)
        .route("/api/internal/v1/files", get(handlers::list_files))
        .route("/api/internal/v1/files/{id}", delete(handlers::delete_file))
        .route(
            "/api/internal/v1/files/{id}/signed_url",
            get(handlers::get_signed_url),
        )
        .route("/api/internal/v1/scavenger", post(handlers::run_scavenger))
        .route(
            "/api/internal/v1/buckets/{name}/archive",
            post(handlers::archive_bucket),
        );

    let mut router = Router::new().merge(api_routes);

    // The /metrics endpoint should be network-restricted to authorized
    // Prometheus scrapers at the infrastructure level.
    if state.config.server.metrics_enabled {
        router = router.merge(Router::new().route("/metrics", get(metrics_handler)));
    }

    router.layer(TraceLayer::new_for_http()).with_state(state)
}
