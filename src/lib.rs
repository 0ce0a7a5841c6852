//! ZenCache - An in-memory, byte-bounded cache server
//!
//! Provides exact LRU eviction under a byte budget, TTL expiry with a
//! background sweep and optional TinyLFU admission, served over HTTP and a
//! Redis-like line protocol.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod resp;
pub mod tasks;

pub use api::AppState;
pub use cache::{Cache, CacheOptions, CacheStats, CacheValue, SetOptions, SetOutcome};
pub use config::Config;
pub use metrics::Metrics;
