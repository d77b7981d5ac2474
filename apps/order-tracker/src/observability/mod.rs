//! Observability module for metrics.
//!
//! Prometheus counters and gauges for the tracker. Logging is set up in
//! [`crate::telemetry`].

mod metrics;

pub use metrics::{
    MetricsError, init_metrics, parse_listen_addr, record_cache_evictions, record_event_emitted,
    record_listener_failure, record_rejected_update, record_stale_update, record_unknown_order,
    update_tracked_orders,
};
