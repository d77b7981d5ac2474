//! Prometheus metrics for the order tracker.
//!
//! Counters cover updates the tracker refused or could not route, events it
//! published and listener failures. Gauges report the size of the active and
//! cached order sets.
//!
//! # Example
//!
//! ```ignore
//! use order_tracker::observability::{init_metrics, record_event_emitted};
//!
//! init_metrics("0.0.0.0:9090".parse()?)?;
//! record_event_emitted("ORDER_FILLED");
//! ```

use metrics::{counter, gauge};
use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;

/// Initialize the Prometheus metrics exporter.
///
/// This starts an HTTP server that exposes metrics at `/metrics`.
///
/// # Errors
///
/// Returns an error if the metrics exporter fails to start (e.g., port already in use).
pub fn init_metrics(listen_addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(listen_addr)
        .install()
        .map_err(|e| MetricsError::Installation(e.to_string()))?;

    tracing::info!(addr = %listen_addr, "Prometheus metrics exporter started");

    Ok(())
}

/// Parse the exporter listen address.
///
/// # Errors
///
/// Returns [`MetricsError::Configuration`] if the address is not `host:port`.
pub fn parse_listen_addr(addr: &str) -> Result<SocketAddr, MetricsError> {
    addr.parse()
        .map_err(|e| MetricsError::Configuration(format!("invalid listen address '{addr}': {e}")))
}

/// Error type for metrics operations.
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Listen address could not be parsed.
    #[error("metrics configuration error: {0}")]
    Configuration(String),
    /// Failed to install metrics exporter.
    #[error("metrics installation error: {0}")]
    Installation(String),
}

// ============================================================================
// Update Metrics
// ============================================================================

/// Record an update for an order that is neither active nor cached.
pub fn record_unknown_order(channel: &str) {
    counter!(
        "order_tracker_unknown_orders_total",
        "channel" => channel.to_string()
    )
    .increment(1);
}

/// Record an update whose sequence was not newer than the last applied one.
pub fn record_stale_update(channel: &str) {
    counter!(
        "order_tracker_stale_updates_total",
        "channel" => channel.to_string()
    )
    .increment(1);
}

/// Record a refused update.
///
/// # Arguments
///
/// * `channel` - `"status"` or `"trade"`
/// * `reason` - Rejection code (e.g., `"invalid_transition"`, `"duplicate_trade"`)
pub fn record_rejected_update(channel: &str, reason: &str) {
    counter!(
        "order_tracker_rejected_updates_total",
        "channel" => channel.to_string(),
        "reason" => reason.to_string()
    )
    .increment(1);
}

// ============================================================================
// Event Metrics
// ============================================================================

/// Record a published event.
pub fn record_event_emitted(event: &str) {
    counter!(
        "order_tracker_events_emitted_total",
        "event" => event.to_string()
    )
    .increment(1);
}

/// Record a listener that returned an error or panicked.
pub fn record_listener_failure(event: &str) {
    counter!(
        "order_tracker_listener_failures_total",
        "event" => event.to_string()
    )
    .increment(1);
}

// ============================================================================
// Store Metrics
// ============================================================================

/// Record cache entries displaced by capacity or expiry.
pub fn record_cache_evictions(count: usize) {
    if count > 0 {
        counter!("order_tracker_cache_evictions_total").increment(count as u64);
    }
}

/// Update the active and cached order gauges.
#[allow(clippy::cast_precision_loss)]
pub fn update_tracked_orders(active: usize, cached: usize) {
    gauge!("order_tracker_active_orders").set(active as f64);
    gauge!("order_tracker_cached_orders").set(cached as f64);
}

// ============================================================================
// Tests
// ============================================================================
