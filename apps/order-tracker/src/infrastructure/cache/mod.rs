//! Caching Adapters
//!
//! Bounded, expiring storage for recently retired orders.

pub mod bounded_ttl_cache;

pub use bounded_ttl_cache::BoundedTtlCache;
