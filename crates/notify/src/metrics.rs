//! Prometheus metrics for the upload reconciler.

use prometheus::{IntCounter, Registry};
use std::sync::{LazyLock, Once};

pub static NOTIFICATIONS_PROCESSED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_upload_notifications_processed_total",
        "Total upload notifications applied and acknowledged",
    )
    .expect("metric creation failed")
});

pub static PARSE_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_upload_notification_parse_errors_total",
        "Total notifications left unacknowledged because they failed to parse",
    )
    .expect("metric creation failed")
});

pub static PROCESSING_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_upload_notification_processing_errors_total",
        "Total notifications left unacknowledged because applying them failed",
    )
    .expect("metric creation failed")
});

pub static RECEIVE_ERRORS: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_upload_notification_receive_errors_total",
        "Total failed receive calls against the notification queue",
    )
    .expect("metric creation failed")
});

pub static PROBES_IGNORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "cabinet_upload_notification_probes_ignored_total",
        "Total storage verification probes acknowledged and discarded",
    )
    .expect("metric creation failed")
});

static REGISTER_ONCE: Once = Once::new();

/// Register the reconciler metrics with the given registry.
///
/// Idempotent - subsequent calls after the first are no-ops.
pub fn register_metrics(registry: &Registry) {
    REGISTER_ONCE.call_once(|| {
        registry
            .register(Box::new(NOTIFICATIONS_PROCESSED.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(PARSE_ERRORS.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(PROCESSING_ERRORS.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(RECEIVE_ERRORS.clone()))
            .expect("metric registration failed");
        registry
            .register(Box::new(PROBES_IGNORED.clone()))
            .expect("metric registration failed");
    });
}
