//! Application Layer
//!
//! The application layer orchestrates domain logic. It defines:
//!
//! - **Ports**: Interfaces for delivering events to subscribers
//! - **Services**: The in-flight order tracker and its cache sweeper

pub mod ports;
pub mod services;

pub use ports::*;
pub use services::*;
