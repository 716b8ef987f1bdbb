//! Prometheus metrics for the file cache.
//!
//! Defined here so the cache crate can count its own outcomes; the server
//! registers them into its registry at startup.

use prometheus::{Histogram, HistogramOpts, IntCounter, Registry};
use std::sync::{LazyLock, Once};

pub static CACHE_HITS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("cabinet_cache_hits_total", "Total file cache hits").expect("metric creation failed")
});

pub static CACHE_MISSES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new("cabinet_cache_misses_total", "Total file cache misses")
        .expect("metric creation failed")
});

pub static CACHE_GET_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_cache_get_failures_total",
        "Total failed file cache reads (failures are swallowed, not surfaced)",
    )
    .expect("metric creation failed")
});

pub static CACHE_SET_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_cache_set_failures_total",
        "Total failed file cache writes (failures are swallowed, not surfaced)",
    )
    .expect("metric creation failed")
});

pub static CACHE_DEL_FAILURES: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_cache_del_failures_total",
        "Total failed file cache invalidations (failures are swallowed, not surfaced)",
    )
    .expect("metric creation failed")
});

pub static CACHE_LATENCY: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "cabinet_cache_op_duration_seconds",
            "Latency of cache backend operations",
        )
        .buckets(vec![0.0005, 0.001, 0.0025, 0.005, 0.01, 0.025, 0.05, 0.1, 0.5, 1.0]),
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register the cache metrics with the given registry.
///
/// Idempotent - subsequent calls after the first are no-ops.
pub fn register_metrics(registry: &Registry) {
    REGISTER_ONCE.call_once(|| {
        registry
            .register(Box::new(CACHE_HITS.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(CACHE_MISSES.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(CACHE_GET_FAILURES.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(CACHE_SET_FAILURES.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(CACHE_DEL_FAILURES.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(CACHE_LATENCY.clone()))
            .expect("metric registration failed");
    });
}
