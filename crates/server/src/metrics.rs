//! Prometheus metrics for the HTTP server.
//!
//! HTTP request metrics live here, queue and status gauges are refreshed on
//! every scrape, and the worker metrics from `seqsearch_core::metrics` are
//! registered in the same registry.

use once_cell::sync::Lazy;
use prometheus::{
    self, Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGauge, IntGaugeVec, Opts,
    Registry, TextEncoder,
};
use regex_lite::Regex;
use seqsearch_core::JobStatus;
use tracing::warn;

use crate::state::AppState;

/// Global metrics registry.
pub static REGISTRY: Lazy<Registry> = Lazy::new(|| {
    let registry = Registry::new();
    register_metrics(&registry);
    registry
});

// =============================================================================
// HTTP Request Metrics
// =============================================================================

/// HTTP request duration in seconds.
pub static HTTP_REQUEST_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "seqsearch_http_request_duration_seconds",
            "HTTP request duration in seconds",
        )
        .buckets(vec![0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5]),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests total count.
pub static HTTP_REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seqsearch_http_requests_total", "Total HTTP requests"),
        &["method", "path", "status"],
    )
    .unwrap()
});

/// HTTP requests currently in flight.
pub static HTTP_REQUESTS_IN_FLIGHT: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new(
        "seqsearch_http_requests_in_flight",
        "Number of HTTP requests currently being processed",
    )
    .unwrap()
});

// =============================================================================
// Queue Metrics (collected dynamically)
// =============================================================================

/// Tickets waiting to be claimed.
pub static QUEUE_DEPTH: Lazy<IntGauge> = Lazy::new(|| {
    IntGauge::new("seqsearch_queue_depth", "Tickets waiting in the pending queue").unwrap()
});

/// Tickets by current status.
pub static TICKETS_BY_STATUS: Lazy<IntGaugeVec> = Lazy::new(|| {
    IntGaugeVec::new(
        Opts::new("seqsearch_tickets_by_status", "Current ticket count by status"),
        &["status"],
    )
    .unwrap()
});

// =============================================================================
// Registration
// =============================================================================

fn register_metrics(registry: &Registry) {
    // HTTP
    registry
        .register(Box::new(HTTP_REQUEST_DURATION.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_TOTAL.clone()))
        .unwrap();
    registry
        .register(Box::new(HTTP_REQUESTS_IN_FLIGHT.clone()))
        .unwrap();

    // Queue
    registry.register(Box::new(QUEUE_DEPTH.clone())).unwrap();
    registry
        .register(Box::new(TICKETS_BY_STATUS.clone()))
        .unwrap();

    // Submission, worker and notification metrics
    for metric in seqsearch_core::metrics::all_metrics() {
        registry.register(metric).unwrap();
    }
}

/// Encode all metrics as Prometheus text format.
pub fn encode_metrics() -> String {
    let encoder = TextEncoder::new();
    let metric_families = REGISTRY.gather();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&metric_families, &mut buffer) {
        warn!(error = %e, "Failed to encode metrics");
    }
    String::from_utf8_lossy(&buffer).into_owned()
}

/// Refresh the gauges that mirror the queue and status tables.
///
/// A failing read leaves the previous value in place.
pub fn collect_dynamic_metrics(state: &AppState) {
    match state.queue().len() {
        Ok(depth) => QUEUE_DEPTH.set(depth as i64),
        Err(e) => warn!(error = %e, "Failed to read queue depth"),
    }

    for status in JobStatus::ALL {
        if let Ok(count) = state.status_store().count_by_status(status) {
            TICKETS_BY_STATUS
                .with_label_values(&[status.as_str()])
                .set(count as i64);
        }
    }
}

static TICKET_SEGMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"/ticket/[^/]+").unwrap());

/// Normalize a path for metric labels.
///
/// Ticket identifiers are client supplied, so every `/ticket/<anything>`
/// collapses into one label value.
pub fn normalize_path(path: &str) -> String {
    TICKET_SEGMENT
        .replace_all(path, "/ticket/{ticket}")
        .into_owned()
}
