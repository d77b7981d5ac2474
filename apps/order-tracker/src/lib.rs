// Allow unwrap/expect in tests - tests should panic on unexpected errors
// Allow test-specific patterns and pedantic lints in test code
#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::panic
    )
)]

//! Order Tracker - Rust Core Library
//!
//! In-flight order tracking and lifecycle event engine for the Cream
//! trading system.
//!
//! # Architecture (Clean Architecture + DDD + Hexagonal)
//!
//! ## Layers (inside → outside)
//!
//! - **Domain**: Core business logic
//!   - `order_tracking`: In-flight order aggregate, state machine, market
//!     events and the event emission policy
//!   - `shared`: Identifiers, timestamps and the clock abstraction
//!
//! - **Application**: Orchestration
//!   - `ports`: `EventSink` and `EventListener`
//!   - `services`: `InFlightOrderTracker` and the cache sweeper
//!
//! - **Infrastructure**: Adapters
//!   - `cache`: Bounded TTL cache
//!   - `persistence`: Tracking store (active orders + retired-order cache)
//!   - `events`: In-process event bus and event logger
//!   - `container`: Tracker wiring
//!
//! # Guarantees
//!
//! - Executed amounts never decrease and states only move forward
//! - Stale and duplicate updates are absorbed without side effects
//! - At most one terminal event per order lifecycle (by default)
//! - Memory for retired orders is bounded by capacity and TTL

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Clean Architecture Layers
// =============================================================================

/// Domain layer - Core business logic with no external dependencies.
pub mod domain;

/// Application layer - Services and port definitions.
pub mod application;

/// Infrastructure layer - Adapters.
pub mod infrastructure;

// =============================================================================
// Cross-cutting
// =============================================================================

/// Configuration loading and validation.
pub mod config;

/// Prometheus metrics.
pub mod observability;

/// Tracing subscriber setup.
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use application::ports::{EventListener, EventSink, ListenerError, RecordingEventSink};
pub use application::services::{
    InFlightOrderTracker, ProcessResult, TrackerStatus, spawn_cache_sweeper,
};
pub use domain::order_tracking::{
    CreateOrderCommand, InFlightOrder, MarketEvent, MarketEventTag, OrderState, OrderType,
    OrderUpdate, TerminalEventPolicy, TrackingError, TradeFee, TradeType, TradeUpdate,
};
pub use domain::shared::{ClientOrderId, Clock, ExchangeOrderId, ManualClock, SystemClock, TradeId};
pub use infrastructure::cache::BoundedTtlCache;
pub use infrastructure::container::Container;
pub use infrastructure::events::{EventBus, EventLogger};
