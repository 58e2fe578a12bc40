//! Prometheus metrics for the queue, workers and notifications.
//!
//! Statics are created lazily; the server registers them all via
//! [`all_metrics`] and exposes them on `/metrics`.

use once_cell::sync::Lazy;
use prometheus::{HistogramOpts, HistogramVec, IntCounter, IntCounterVec, Opts};

// =============================================================================
// Submission
// =============================================================================

/// Tickets accepted by the submission service.
pub static TICKETS_SUBMITTED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seqsearch_tickets_submitted_total",
        "Total tickets submitted",
    )
    .unwrap()
});

// =============================================================================
// Worker
// =============================================================================

/// Queue entries claimed by workers.
pub static JOBS_CLAIMED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seqsearch_jobs_claimed_total",
        "Total queue entries claimed by workers",
    )
    .unwrap()
});

/// Job outcomes by kind.
pub static JOB_OUTCOMES: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new("seqsearch_job_outcomes_total", "Total job outcomes"),
        &["outcome"], // "success", "launch_error", "runtime_error", "timeout"
    )
    .unwrap()
});

/// Pipeline wall-clock duration.
pub static JOB_DURATION: Lazy<HistogramVec> = Lazy::new(|| {
    HistogramVec::new(
        HistogramOpts::new(
            "seqsearch_job_duration_seconds",
            "Duration of pipeline executions",
        )
        .buckets(vec![
            1.0, 10.0, 30.0, 60.0, 300.0, 600.0, 1200.0, 1800.0, 3600.0, 7200.0,
        ]),
        &["outcome"],
    )
    .unwrap()
});

/// Failed claim attempts (queue unavailable).
pub static QUEUE_CLAIM_ERRORS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seqsearch_queue_claim_errors_total",
        "Total failed queue claim attempts",
    )
    .unwrap()
});

/// Claimed entries that failed ticket validation.
pub static INVALID_TICKETS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seqsearch_invalid_tickets_total",
        "Total claimed queue entries with an invalid ticket",
    )
    .unwrap()
});

/// Claimed tickets skipped because they were no longer pending.
pub static DUPLICATE_CLAIMS: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seqsearch_duplicate_claims_total",
        "Claimed tickets skipped because they were not pending",
    )
    .unwrap()
});

/// RUNNING tickets failed by the reaper.
pub static TICKETS_REAPED: Lazy<IntCounter> = Lazy::new(|| {
    IntCounter::new(
        "seqsearch_tickets_reaped_total",
        "Total abandoned RUNNING tickets marked as ERROR",
    )
    .unwrap()
});

// =============================================================================
// Notifications
// =============================================================================

/// Notification dispatches by result.
pub static NOTIFICATIONS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    IntCounterVec::new(
        Opts::new(
            "seqsearch_notifications_total",
            "Total outcome notifications",
        ),
        &["result"], // "sent", "skipped", "failed"
    )
    .unwrap()
});

// =============================================================================
// Helper functions
// =============================================================================

/// Get all core metrics for registration in a registry.
pub fn all_metrics() -> Vec<Box<dyn prometheus::core::Collector>> {
    vec![
        Box::new(TICKETS_SUBMITTED.clone()),
        Box::new(JOBS_CLAIMED.clone()),
        Box::new(JOB_OUTCOMES.clone()),
        Box::new(JOB_DURATION.clone()),
        Box::new(QUEUE_CLAIM_ERRORS.clone()),
        Box::new(INVALID_TICKETS.clone()),
        Box::new(TICKETS_REAPED.clone()),
        Box::new(DUPLICATE_CLAIMS.clone()),
        Box::new(NOTIFICATIONS_TOTAL.clone()),
    ]
}
