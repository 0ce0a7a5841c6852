//! Cache Store Module
//!
//! Main cache engine: a key map coordinated with the recency list, the expiry
//! heap and the optional admission sketch, under a byte capacity.
//!
//! `CacheStore` is not synchronized. [`crate::cache::Cache`] wraps it in a
//! mutex and runs the background sweep.

use std::collections::HashMap;

use tracing::debug;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::lru::RecencyList;
use crate::cache::sizeof::approximate_size_of;
use crate::cache::sketch::FrequencySketch;
use crate::cache::stats::{CacheCounters, CacheStats, POLICY_NAME};
use crate::cache::ttl_heap::ExpiryHeap;
use crate::cache::{CacheEntry, CacheOptions, CacheValue, SetOptions, SetOutcome};

// == Cache Store ==
/// Byte-bounded LRU cache with TTL expiry and TinyLFU admission.
#[derive(Debug)]
pub struct CacheStore {
    /// Key-value storage
    entries: HashMap<String, CacheEntry>,
    /// Access order, most recent first
    recency: RecencyList,
    /// Scheduled expirations, earliest first
    expiry: ExpiryHeap,
    /// Frequency sketch, present when admission control is on
    admission: Option<FrequencySketch>,
    /// Sum of `size` over all entries
    total_size: u64,
    /// Byte budget
    capacity: u64,
    counters: CacheCounters,
    /// Creation time (Unix milliseconds)
    started_at: u64,
}

impl CacheStore {
    // == Constructor ==
    /// Creates an empty store. The sweep interval in `options` is ignored here;
    /// it belongs to the task driving [`CacheStore::sweep_expired`].
    pub fn new(options: CacheOptions) -> Self {
        Self {
            entries: HashMap::new(),
            recency: RecencyList::new(),
            expiry: ExpiryHeap::new(),
            admission: options.enable_tiny_lfu.then(FrequencySketch::new),
            total_size: 0,
            capacity: options.capacity_bytes,
            counters: CacheCounters::new(),
            started_at: current_timestamp_ms(),
        }
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// Missing and expired keys count as misses; an expired entry is purged.
    /// A hit promotes the key and bumps its frequency.
    pub fn get(&mut self, key: &str) -> Option<CacheValue> {
        self.get_at(key, current_timestamp_ms())
    }

    pub(crate) fn get_at(&mut self, key: &str, now: u64) -> Option<CacheValue> {
        let (node, value) = match self.entries.get(key) {
            None => {
                self.counters.record_miss();
                return None;
            }
            Some(entry) if entry.is_expired_at(now) => {
                self.counters.record_miss();
                self.purge(key);
                return None;
            }
            Some(entry) => (entry.node, entry.value.clone()),
        };

        self.recency.move_to_front(node);
        self.counters.record_hit();
        if let Some(sketch) = self.admission.as_mut() {
            sketch.increment(key);
        }
        Some(value)
    }

    // == Has ==
    /// Checks whether a live, unexpired entry exists.
    ///
    /// Purges the entry if it has expired, but leaves counters and recency
    /// untouched.
    pub fn has(&mut self, key: &str) -> bool {
        self.has_at(key, current_timestamp_ms())
    }

    pub(crate) fn has_at(&mut self, key: &str, now: u64) -> bool {
        match self.entries.get(key) {
            None => false,
            Some(entry) if entry.is_expired_at(now) => {
                self.purge(key);
                false
            }
            Some(_) => true,
        }
    }

    // == Set ==
    /// Stores a value.
    ///
    /// Existing keys are always replaced. A new key that would push the total
    /// over capacity is compared against the LRU tail when admission control is
    /// on, and rejected without touching any other state if it is colder.
    /// Capacity is enforced after every admitted write.
    pub fn set(&mut self, key: String, value: CacheValue, options: SetOptions) -> SetOutcome {
        self.set_at(key, value, options, current_timestamp_ms())
    }

    pub(crate) fn set_at(
        &mut self,
        key: String,
        value: CacheValue,
        options: SetOptions,
        now: u64,
    ) -> SetOutcome {
        // anything over capacity is evicted on arrival, so its accounted
        // size never needs to exceed capacity + 1
        let size = options
            .size_override
            .unwrap_or_else(|| approximate_size_of(&value))
            .min(self.capacity.saturating_add(1));
        let expires_at = options
            .ttl_ms
            .filter(|ttl| *ttl > 0)
            .map(|ttl| now.saturating_add(ttl));

        if let Some(entry) = self.entries.get_mut(&key) {
            self.total_size = (self.total_size - entry.size).saturating_add(size);
            entry.value = value;
            entry.size = size;
            entry.expires_at = expires_at;
            let node = entry.node;
            let old_pos = entry.heap_pos.take();

            self.recency.move_to_front(node);
            if let Some(pos) = old_pos {
                self.unschedule(pos);
            }
            if let Some(at) = expires_at {
                self.schedule(&key, at);
            }
            self.touch_frequency(&key);
            self.enforce_capacity();
            return SetOutcome::Updated;
        }

        if let Some(sketch) = self.admission.as_mut() {
            if self.total_size.saturating_add(size) > self.capacity {
                if let Some(victim) = self.recency.peek_tail_key() {
                    let candidate = sketch.estimate(&key);
                    let incumbent = sketch.estimate(victim);
                    if candidate < incumbent {
                        sketch.increment(&key);
                        self.counters.record_rejection();
                        debug!(key = %key, candidate, incumbent, "Admission rejected");
                        return SetOutcome::Rejected;
                    }
                }
            }
        }

        let node = self.recency.insert_front(key.clone());
        self.entries
            .insert(key.clone(), CacheEntry::new(value, size, expires_at, node, now));
        self.total_size = self.total_size.saturating_add(size);
        if let Some(at) = expires_at {
            self.schedule(&key, at);
        }
        self.touch_frequency(&key);
        self.enforce_capacity();
        SetOutcome::Created
    }

    // == Delete ==
    /// Removes an entry by key. Returns false if it was absent.
    pub fn delete(&mut self, key: &str) -> bool {
        self.purge(key).is_some()
    }

    // == Clear ==
    /// Drops every entry. Hit, miss, eviction and rejection counters survive.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.recency.clear();
        self.expiry.clear();
        self.total_size = 0;
    }

    // == TTL Remaining ==
    /// Returns the remaining TTL in milliseconds, or None if the key is absent
    /// or never expires.
    pub fn ttl_remaining_ms(&self, key: &str) -> Option<u64> {
        self.ttl_remaining_ms_at(key, current_timestamp_ms())
    }

    pub(crate) fn ttl_remaining_ms_at(&self, key: &str, now: u64) -> Option<u64> {
        self.entries.get(key)?.ttl_remaining_ms_at(now)
    }

    // == Stats ==
    /// Returns a snapshot of the current cache statistics.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            items: self.entries.len(),
            total_size_bytes: self.total_size,
            hits: self.counters.hits,
            misses: self.counters.misses,
            evictions: self.counters.evictions,
            rejections: self.counters.rejections,
            capacity_bytes: self.capacity,
            policy: POLICY_NAME.to_string(),
            started_at: self.started_at,
            lfu_enabled: self.admission.is_some(),
        }
    }

    // == Sweep Expired ==
    /// Purges entries whose expiration has passed, earliest first.
    ///
    /// Returns the number of entries removed.
    pub fn sweep_expired(&mut self) -> usize {
        self.sweep_expired_at(current_timestamp_ms())
    }

    pub(crate) fn sweep_expired_at(&mut self, now: u64) -> usize {
        let mut removed = 0;
        while let Some(top) = self.expiry.peek() {
            if top.expires_at > now {
                break;
            }
            let Some(item) = self.expiry.pop(reposition_in(&mut self.entries)) else {
                break;
            };
            let expired = match self.entries.get_mut(&item.key) {
                Some(entry) => {
                    entry.heap_pos = None;
                    entry.is_expired_at(now)
                }
                None => false,
            };
            if expired {
                self.purge(&item.key);
                removed += 1;
            }
        }
        removed
    }

    // == Frequency Estimate ==
    /// Returns the admission sketch's estimate for a key, if admission is on.
    pub fn frequency_estimate(&self, key: &str) -> Option<u16> {
        self.admission.as_ref().map(|sketch| sketch.estimate(key))
    }

    // == Length ==
    /// Returns the current number of entries in the cache.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Sum of the sizes of all live entries.
    pub fn total_size(&self) -> u64 {
        self.total_size
    }

    /// Evicts from the LRU tail until the total fits the capacity.
    fn enforce_capacity(&mut self) {
        while self.total_size > self.capacity {
            let Some(victim) = self.recency.pop_tail() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&victim) {
                self.release(&entry);
                self.counters.record_eviction();
                debug!(key = %victim, size = entry.size, "Evicted entry");
            }
        }
    }

    /// Removes an entry from the map, the recency list and the expiry heap.
    fn purge(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(entry.node);
        self.release(&entry);
        Some(entry)
    }

    /// Drops a removed entry's expiry item and its share of the total.
    fn release(&mut self, entry: &CacheEntry) {
        if let Some(pos) = entry.heap_pos {
            self.unschedule(pos);
        }
        self.total_size -= entry.size;
    }

    /// Schedules `key`, which must already be in the map.
    fn schedule(&mut self, key: &str, expires_at: u64) {
        self.expiry
            .push(key.to_string(), expires_at, reposition_in(&mut self.entries));
    }

    fn unschedule(&mut self, pos: usize) {
        self.expiry.remove_at(pos, reposition_in(&mut self.entries));
    }

    fn touch_frequency(&mut self, key: &str) {
        if let Some(sketch) = self.admission.as_mut() {
            sketch.increment(key);
        }
    }

    /// Checks the cross-structure invariants. Panics on the first violation.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) {
        self.recency.check_invariants();
        self.expiry.check_heap_property();
        assert_eq!(self.entries.len(), self.recency.len(), "map/recency size mismatch");

        let mut total = 0;
        let mut scheduled = 0;
        for (key, entry) in &self.entries {
            assert_eq!(self.recency.key(entry.node), Some(key.as_str()), "bad node for {key}");
            total += entry.size;
            match (entry.expires_at, entry.heap_pos) {
                (Some(at), Some(pos)) => {
                    let item = self.expiry.get(pos).expect("heap position out of range");
                    assert_eq!(item.key, *key, "heap position of {key} points elsewhere");
                    assert_eq!(item.expires_at, at, "heap item of {key} has a stale time");
                    scheduled += 1;
                }
                (None, None) => {}
                other => panic!("expiry/heap position disagree for {key}: {other:?}"),
            }
        }
        assert_eq!(scheduled, self.expiry.len(), "orphaned heap items");
        assert_eq!(total, self.total_size, "running total drifted");
    }
}

/// Builds the heap callback that records new slots on the owning entries.
fn reposition_in(entries: &mut HashMap<String, CacheEntry>) -> impl FnMut(&str, usize) + '_ {
    move |key: &str, idx: usize| {
        if let Some(entry) = entries.get_mut(key) {
            entry.heap_pos = Some(idx);
        }
    }
}
