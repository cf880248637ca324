//! Metrics for observability.
//!
//! Exports Prometheus-compatible metrics for:
//! - Feeder progress (records queued, lines skipped)
//! - Per-object outcomes and copy durations
//! - Bytes moved
//! - Worker pool and engine state
//!
//! # Metric Naming Convention
//!
//! All metrics are prefixed with `replicopy_` and follow Prometheus
//! conventions:
//! - Counters end in `_total`
//! - Gauges represent current state
//! - Histograms track distributions (duration, size)
//!
//! # Usage
//!
//! ```rust,no_run
//! use replicopy::metrics;
//! use replicopy::record::OutcomeKind;
//! use std::time::Duration;
//!
//! // In the feeder after enqueueing a record
//! metrics::record_task_queued();
//!
//! // In a worker after finishing one object
//! metrics::record_object_outcome(OutcomeKind::Success);
//! metrics::record_copy_duration(Duration::from_millis(120));
//! ```

use std::time::Duration;

use metrics::{counter, gauge, histogram};

use crate::record::OutcomeKind;

/// Record one task pushed into the task queue.
pub fn record_task_queued() {
    counter!("replicopy_tasks_queued_total").increment(1);
}

/// Record input lines skipped by the resume prefix.
pub fn record_lines_skipped(count: u64) {
    if count > 0 {
        counter!("replicopy_lines_skipped_total").increment(count);
    }
}

/// Record how one object's copy attempt ended.
pub fn record_object_outcome(outcome: OutcomeKind) {
    counter!("replicopy_objects_total", "outcome" => outcome.as_str()).increment(1);
}

/// Record bytes uploaded for a copied object.
pub fn record_bytes_copied(bytes: i64) {
    if bytes > 0 {
        counter!("replicopy_bytes_copied_total").increment(bytes as u64);
    }
}

/// Record the wall time one copy decision took (probe through outcome).
pub fn record_copy_duration(duration: Duration) {
    histogram!("replicopy_copy_duration_seconds").record(duration.as_secs_f64());
}

/// Gauge for the number of live workers in the pool.
pub fn set_active_workers(count: usize) {
    gauge!("replicopy_active_workers").set(count as f64);
}

/// Gauge for engine state.
pub fn set_engine_state(state: &str) {
    // Encode state as numeric for alerting (0=created, 1=running, etc.)
    let value = match state {
        "Created" => 0.0,
        "Running" => 1.0,
        "ShuttingDown" => 2.0,
        "Stopped" => 3.0,
        "Failed" => 4.0,
        _ => -1.0,
    };
    gauge!("replicopy_engine_state").set(value);
}

/// Record a completed run with its final accounting.
pub fn record_run_complete(copied: u64, failed: u64, duration: Duration) {
    counter!("replicopy_runs_total").increment(1);
    counter!("replicopy_run_objects_total", "outcome" => "success").increment(copied);
    if failed > 0 {
        counter!("replicopy_run_objects_total", "outcome" => "failure").increment(failed);
    }
    histogram!("replicopy_run_duration_seconds").record(duration.as_secs_f64());
}
