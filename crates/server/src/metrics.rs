//! Prometheus metrics for the sqldepot server.
//!
//! Exposes metrics for upload outcomes, stored bytes, rollback actions and
//! conversion latency.
//!
//! # Security Note
//!
//! The `/metrics` endpoint is unauthenticated to allow Prometheus scraping.
//! Metrics carry no identifiers or paths, only aggregate counts. Restrict
//! the endpoint to scraper addresses at the network level, or disable it
//! with `server.metrics_enabled = false`.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    self, Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::{LazyLock, Once};

/// Global Prometheus registry for all metrics.
pub static REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

pub static UPLOADS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "sqldepot_uploads_total",
            "Total upload requests by endpoint and outcome",
        ),
        &["endpoint", "outcome"],
    )
    .expect("metric creation failed")
});

pub static BYTES_STORED: LazyLock<IntCounter> = LazyLock::new(|| {
    IntCounter::new(
        "sqldepot_bytes_stored_total",
        "Total bytes written to storage by successful uploads",
    )
    .expect("metric creation failed")
});

pub static UPLOADS_IN_FLIGHT: LazyLock<IntGauge> = LazyLock::new(|| {
    IntGauge::new(
        "sqldepot_uploads_in_flight",
        "Number of uploads currently holding an identifier claim",
    )
    .expect("metric creation failed")
});

pub static COMPENSATIONS: LazyLock<IntCounterVec> = LazyLock::new(|| {
    IntCounterVec::new(
        Opts::new(
            "sqldepot_compensations_total",
            "Rollback actions run after a failed upload step, by action and result",
        ),
        &["action", "result"],
    )
    .expect("metric creation failed")
});

pub static CONVERSION_DURATION: LazyLock<Histogram> = LazyLock::new(|| {
    Histogram::with_opts(
        HistogramOpts::new(
            "sqldepot_conversion_duration_seconds",
            "Time taken by the SQL-to-database conversion",
        )
        .buckets(vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0, 300.0]),
    )
    .expect("metric creation failed")
});

/// Guard to ensure metrics are only registered once.
static REGISTER_ONCE: Once = Once::new();

/// Register all metrics with the global registry.
///
/// This function is idempotent - subsequent calls after the first are no-ops.
/// This allows safe use in integration tests or when embedding multiple routers.
pub fn register_metrics() {
    REGISTER_ONCE.call_once(|| {
        REGISTRY
            .register(Box::new(UPLOADS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(BYTES_STORED.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(UPLOADS_IN_FLIGHT.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(COMPENSATIONS.clone()))
            .expect("metric registration failed");
        REGISTRY
            .register(Box::new(CONVERSION_DURATION.clone()))
            .expect("metric registration failed");
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

/// Record the outcome of an upload request.
pub fn record_upload(endpoint: &str, outcome: &str) {
    UPLOADS.with_label_values(&[endpoint, outcome]).inc();
}

/// Record a rollback action and whether it succeeded.
pub fn record_compensation(action: &str, result: &str) {
    COMPENSATIONS.with_label_values(&[action, result]).inc();
}
