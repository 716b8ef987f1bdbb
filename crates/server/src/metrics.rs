//! Prometheus metrics for the Cabinet server.
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping
//! and should be network-restricted at the infrastructure level.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{Encoder, IntCounter, Registry, TextEncoder};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

// File API metrics
pub static FILES_CREATED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("cabinet_files_created_total", "Total file rows created")
        .expect("metric creation failed")
});

pub static FILES_RETRIEVED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("cabinet_files_retrieved_total", "Total file lookups served")
        .expect("metric creation failed")
});

pub static FILES_DELETED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("cabinet_files_deleted_total", "Total file rows deleted via the API")
        .expect("metric creation failed")
});

pub static FILE_NOT_FOUND_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_file_not_found_errors_total",
        "Total lookups of file identities that do not exist",
    )
    .expect("metric creation failed")
});

pub static SIGNED_URLS_ISSUED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_signed_urls_issued_total",
        "Total pre-signed URLs issued",
    )
    .expect("metric creation failed")
});

pub static SIGNED_URLS_FORBIDDEN: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_signed_urls_forbidden_total",
        "Total signed URL requests rejected for quarantined files",
    )
    .expect("metric creation failed")
});

// Scavenger metrics
pub static SCAVENGER_RUNS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_scavenger_runs_total",
        "Total completed scavenger runs",
    )
    .expect("metric creation failed")
});

pub static SCAVENGER_RUNS_ABANDONED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_scavenger_runs_abandoned_total",
        "Total scavenger runs abandoned because the leader lock was never acquired",
    )
    .expect("metric creation failed")
});

pub static SCAVENGER_RUN_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_scavenger_run_failures_total",
        "Total scavenger runs that failed against the database",
    )
    .expect("metric creation failed")
});

pub static SCAVENGED_FILES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_scavenged_files_total",
        "Total expired file rows deleted by the scavenger",
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry, including the cache and
/// reconciler metrics contributed by their crates.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(FILES_CREATED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FILES_RETRIEVED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FILES_DELETED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(FILE_NOT_FOUND_ERRORS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SIGNED_URLS_ISSUED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SIGNED_URLS_FORBIDDEN.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SCAVENGER_RUNS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SCAVENGER_RUNS_ABANDONED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SCAVENGER_RUN_FAILURES.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(SCAVENGED_FILES.clone()))
            .expect("metric registration failed");

        cabinet_cache::metrics::register_metrics(&REGISTRY);
        cabinet_notify::metrics::register_metrics(&REGISTRY);
    });
}

/// GET /metrics - Prometheus metrics endpoint.
pub async fn metrics_handler() -> impl IntoResponse {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();

    let mut buffer = Vec::new();
    match encoder.encode(&metric_families, &mut buffer) {
        Ok(()) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            buffer,
        ),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            [("content-type", "text/plain; charset=utf-8")],
            format!("Failed to encode metrics: {e}").into_bytes(),
        ),
    }
}
