//! Cache Entry Module
//!
//! Defines the per-key record held by the store, including its links into the
//! recency list and the expiry heap.

use crate::cache::lru::NodeHandle;
use crate::cache::CacheValue;

// == Cache Entry ==
/// A single live key's value and metadata.
///
/// `heap_pos` is `Some` exactly when `expires_at` is `Some`, and always names
/// the slot of this entry's item in the expiry heap.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// The stored value
    pub value: CacheValue,
    /// Accounted size in bytes
    pub size: u64,
    /// Creation timestamp (Unix milliseconds)
    pub created_at: u64,
    /// Expiration timestamp (Unix milliseconds), None = no expiration
    pub expires_at: Option<u64>,
    /// Position in the recency list
    pub(crate) node: NodeHandle,
    /// Current slot in the expiry heap
    pub(crate) heap_pos: Option<usize>,
}

impl CacheEntry {
    // == Constructor ==
    pub(crate) fn new(
        value: CacheValue,
        size: u64,
        expires_at: Option<u64>,
        node: NodeHandle,
        now: u64,
    ) -> Self {
        Self {
            value,
            size,
            created_at: now,
            expires_at,
            node,
            heap_pos: None,
        }
    }

    // == Is Expired ==
    /// Checks whether the entry has expired at `now`.
    ///
    /// An entry whose expiration instant equals `now` is already expired.
    pub fn is_expired_at(&self, now: u64) -> bool {
        matches!(self.expires_at, Some(expires) if expires <= now)
    }

    // == Time To Live ==
    /// Returns remaining TTL in milliseconds at `now`, or None if no expiration
    /// is set. Saturates at zero once expired.
    pub fn ttl_remaining_ms_at(&self, now: u64) -> Option<u64> {
        self.expires_at
            .map(|expires| expires.saturating_sub(now))
    }
}

// == Utility Functions ==
/// Returns current Unix timestamp in milliseconds.
pub fn current_timestamp_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::lru::RecencyList;

    fn entry(expires_at: Option<u64>) -> CacheEntry {
        let mut list = RecencyList::new();
        let node = list.insert_front("k".to_string());
        CacheEntry::new(CacheValue::from("v"), 1, expires_at, node, 1_000)
    }

    #[test]
    fn test_entry_creation_no_ttl() {
        let entry = entry(None);

        assert_eq!(entry.value, CacheValue::from("v"));
        assert_eq!(entry.created_at, 1_000);
        assert!(entry.heap_pos.is_none());
        assert!(!entry.is_expired_at(u64::MAX));
        assert!(entry.ttl_remaining_ms_at(5_000).is_none());
    }

    #[test]
    fn test_expiration_boundary_condition() {
        let entry = entry(Some(2_000));

        assert!(!entry.is_expired_at(1_999));
        assert!(entry.is_expired_at(2_000), "Entry should be expired at boundary");
        assert!(entry.is_expired_at(2_001));
    }

    #[test]
    fn test_ttl_remaining_ms() {
        let entry = entry(Some(2_000));

        assert_eq!(entry.ttl_remaining_ms_at(1_250), Some(750));
        assert_eq!(entry.ttl_remaining_ms_at(2_000), Some(0));
        assert_eq!(entry.ttl_remaining_ms_at(9_000), Some(0));
    }

    #[test]
    fn test_current_timestamp_is_recent() {
        let now = current_timestamp_ms();
        // 2020-01-01T00:00:00Z
        assert!(now > 1_577_836_800_000);
    }
}
