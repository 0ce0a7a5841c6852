//! Size Estimator
//!
//! Approximates the in-memory footprint of a value for capacity accounting.

use crate::cache::CacheValue;

/// Bytes charged for a number, whatever its magnitude.
pub const NUMBER_SIZE: u64 = 8;

/// Bytes charged for a structured value that fails to serialize.
pub const FALLBACK_SIZE: u64 = 64;

/// Estimates the byte size of a value.
///
/// Text is its UTF-8 length, numbers are 8 bytes, booleans 1 byte and null 0.
/// Structured values cost the length of their compact JSON encoding.
pub fn approximate_size_of(value: &CacheValue) -> u64 {
    match value {
        CacheValue::Text(s) => s.len() as u64,
        CacheValue::Number(_) => NUMBER_SIZE,
        CacheValue::Bool(_) => 1,
        CacheValue::Null => 0,
        CacheValue::Structured(v) => serde_json::to_vec(v)
            .map(|bytes| bytes.len() as u64)
            .unwrap_or(FALLBACK_SIZE),
    }
}
