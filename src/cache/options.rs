//! Cache Options Module
//!
//! Construction and per-write options, plus the result of a write.

/// Default period of the background expiry sweep.
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 100;

// == Cache Options ==
/// Parameters fixed for the lifetime of a cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOptions {
    /// Byte budget for the sum of entry sizes
    pub capacity_bytes: u64,
    /// Period of the background expiry sweep
    pub sweep_interval_ms: u64,
    /// Gate new keys through the frequency sketch when full
    pub enable_tiny_lfu: bool,
}

impl CacheOptions {
    /// Creates options with the given capacity, a 100ms sweep and admission off.
    pub fn new(capacity_bytes: u64) -> Self {
        Self {
            capacity_bytes,
            sweep_interval_ms: DEFAULT_SWEEP_INTERVAL_MS,
            enable_tiny_lfu: false,
        }
    }

    pub fn with_sweep_interval_ms(mut self, sweep_interval_ms: u64) -> Self {
        self.sweep_interval_ms = sweep_interval_ms;
        self
    }

    pub fn with_tiny_lfu(mut self, enabled: bool) -> Self {
        self.enable_tiny_lfu = enabled;
        self
    }
}

// == Set Options ==
/// Per-write options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Time to live in milliseconds. `None` or `Some(0)` means no expiry.
    pub ttl_ms: Option<u64>,
    /// Exact size to account instead of the estimate
    pub size_override: Option<u64>,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.ttl_ms = Some(ttl_ms);
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size_override = Some(size);
        self
    }
}

/// Reads a millisecond TTL from its leading decimal digits, so `"10abc"`
/// is 10 and `"1.5"` is 1. Negative, zero and digitless input mean no TTL.
pub fn parse_ttl_ms(raw: &str) -> Option<u64> {
    let raw = raw.trim_start();
    let (negative, rest) = match raw.as_bytes().first() {
        Some(b'-') => (true, &raw[1..]),
        Some(b'+') => (false, &raw[1..]),
        _ => (false, raw),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 || negative {
        return None;
    }
    let ttl = rest[..digits]
        .bytes()
        .fold(0u64, |acc, d| acc.saturating_mul(10).saturating_add(u64::from(d - b'0')));
    Some(ttl).filter(|ttl| *ttl > 0)
}

// == Set Outcome ==
/// What a `set` did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOutcome {
    /// A new entry was stored
    Created,
    /// An existing entry was replaced
    Updated,
    /// A new key was turned away by the admission estimator
    Rejected,
}

impl SetOutcome {
    /// Returns true unless the write was rejected.
    pub fn is_admitted(self) -> bool {
        !matches!(self, SetOutcome::Rejected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cache_options_defaults() {
        let options = CacheOptions::new(1024);
        assert_eq!(options.capacity_bytes, 1024);
        assert_eq!(options.sweep_interval_ms, 100);
        assert!(!options.enable_tiny_lfu);

        let options = options.with_sweep_interval_ms(5).with_tiny_lfu(true);
        assert_eq!(options.sweep_interval_ms, 5);
        assert!(options.enable_tiny_lfu);
    }

    #[test]
    fn test_set_options_builders() {
        let options = SetOptions::new().with_ttl_ms(50).with_size(3);
        assert_eq!(options.ttl_ms, Some(50));
        assert_eq!(options.size_override, Some(3));
    }

    #[test]
    fn test_parse_ttl_ms_reads_leading_digits() {
        assert_eq!(parse_ttl_ms("1500"), Some(1500));
        assert_eq!(parse_ttl_ms("  42"), Some(42));
        assert_eq!(parse_ttl_ms("+7"), Some(7));
        assert_eq!(parse_ttl_ms("10abc"), Some(10));
        assert_eq!(parse_ttl_ms("1.5"), Some(1));
        assert_eq!(parse_ttl_ms("99999999999999999999999"), Some(u64::MAX));
    }

    #[test]
    fn test_parse_ttl_ms_without_ttl() {
        for raw in ["", "abc", "-5", "0", "-0", ".5", "+"] {
            assert_eq!(parse_ttl_ms(raw), None, "ttl={:?}", raw);
        }
    }

    #[test]
    fn test_outcome_admission() {
        assert!(SetOutcome::Created.is_admitted());
        assert!(SetOutcome::Updated.is_admitted());
        assert!(!SetOutcome::Rejected.is_admitted());
    }
}
