//! Cache Module
//!
//! In-memory cache engine: exact LRU ordering, a TTL min-heap, TinyLFU
//! admission and byte-budget capacity enforcement.

mod engine;
mod entry;
pub mod lru;
mod options;
pub mod sizeof;
pub mod sketch;
mod stats;
mod store;
pub mod ttl_heap;
mod value;


// Re-export public types
pub use engine::Cache;
pub use entry::{current_timestamp_ms, CacheEntry};
pub use options::{
    parse_ttl_ms, CacheOptions, SetOptions, SetOutcome, DEFAULT_SWEEP_INTERVAL_MS,
};
pub use sizeof::approximate_size_of;
pub use stats::{CacheCounters, CacheStats, POLICY_NAME};
pub use store::CacheStore;
pub use value::CacheValue;
