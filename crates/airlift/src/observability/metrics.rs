//! Metrics definitions for the airlift.
//!
//! All metrics follow Prometheus naming conventions:
//! - `airlift_` prefix
//! - `_total` suffix for counters
//!
//! # Cardinality
//!
//! Labels are bounded:
//! - `monitor`: 3 values (departure, plane, destination)
//! - `operation`: bounded by the monitor operations (~20 values)
//! - `actor`: 4 values (passenger, hostess, pilot, runtime for a client
//!   group task that failed to join)
//! - `error_type`: bounded by `AirliftError::error_type`

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};

/// Initialize the Prometheus metrics recorder and return its handle.
///
/// Must be called before any metrics are recorded.
///
/// # Errors
///
/// Returns error if the recorder fails to install (e.g., already installed).
pub fn init_metrics_recorder() -> Result<PrometheusHandle, String> {
    PrometheusBuilder::new()
        // Flight headcounts: one bucket per seat is enough for any sane plane
        .set_buckets_for_metric(
            Matcher::Full("airlift_flight_headcount".to_string()),
            &[1.0, 2.0, 3.0, 5.0, 8.0, 10.0, 15.0, 20.0, 50.0],
        )
        .map_err(|e| format!("Failed to set flight headcount buckets: {e}"))?
        .install_recorder()
        .map_err(|e| format!("Failed to install Prometheus recorder: {e}"))
}

/// Record one operation served by a monitor.
///
/// Metric: `airlift_monitor_calls_total`
/// Labels: `monitor`, `operation`
pub fn record_monitor_call(monitor: &'static str, operation: &'static str) {
    counter!(
        "airlift_monitor_calls_total",
        "monitor" => monitor,
        "operation" => operation
    )
    .increment(1);
}

/// Set the number of passengers waiting at the departure counter.
///
/// Metric: `airlift_boarding_queue_depth`
#[allow(clippy::cast_precision_loss)]
pub fn set_boarding_queue_depth(depth: usize) {
    gauge!("airlift_boarding_queue_depth").set(depth as f64);
}

/// Record a departed flight.
///
/// Metrics: `airlift_flights_total`, `airlift_flight_headcount`
#[allow(clippy::cast_precision_loss)]
pub fn record_flight_departed(headcount: usize) {
    counter!("airlift_flights_total").increment(1);
    histogram!("airlift_flight_headcount").record(headcount as f64);
}

/// Set the cumulative number of transported passengers.
///
/// Metric: `airlift_passengers_transported`
#[allow(clippy::cast_precision_loss)]
pub fn set_passengers_transported(total: usize) {
    gauge!("airlift_passengers_transported").set(total as f64);
}

/// Record a fatal actor failure.
///
/// Metric: `airlift_actor_failures_total`
/// Labels: `actor`, `error_type`
pub fn record_actor_failure(actor: &'static str, error_type: &'static str) {
    counter!(
        "airlift_actor_failures_total",
        "actor" => actor,
        "error_type" => error_type
    )
    .increment(1);
}
