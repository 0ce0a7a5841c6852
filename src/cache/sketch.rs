//! Admission Estimator Module
//!
//! TinyLFU-style Count-Min Sketch with periodic aging. It answers "how often
//! has this key been touched recently" for admission decisions and has no
//! notion of eviction.

/// Number of counter rows.
pub const DEPTH: usize = 4;

/// Counters per row. Must be a power of two.
pub const WIDTH: usize = 2048;

/// Every counter is halved after this many increments.
pub const AGE_EVERY: u64 = 10_000;

const MASK: u32 = (WIDTH - 1) as u32;

// == Frequency Sketch ==
/// Approximate, recency-decayed access counter.
///
/// Counters are 16 bit and saturate at `u16::MAX`. Estimates can only
/// over-count, and taking the minimum across rows limits the collision bias.
#[derive(Debug, Clone)]
pub struct FrequencySketch {
    rows: Vec<Vec<u16>>,
    ops: u64,
    age_every: u64,
}

impl FrequencySketch {
    // == Constructor ==
    pub fn new() -> Self {
        Self::with_aging(AGE_EVERY)
    }

    /// Creates a sketch that ages after `age_every` increments.
    pub fn with_aging(age_every: u64) -> Self {
        Self {
            rows: vec![vec![0u16; WIDTH]; DEPTH],
            ops: 0,
            age_every: age_every.max(1),
        }
    }

    // == Increment ==
    /// Records one access of `key`.
    pub fn increment(&mut self, key: &str) {
        let hashes = hash_key(key.as_bytes());
        for (row, hash) in self.rows.iter_mut().zip(hashes) {
            let counter = &mut row[(hash & MASK) as usize];
            *counter = counter.saturating_add(1);
        }
        self.ops += 1;
        if self.ops % self.age_every == 0 {
            self.age();
        }
    }

    // == Estimate ==
    /// Returns the estimated recent access count of `key`.
    pub fn estimate(&self, key: &str) -> u16 {
        let hashes = hash_key(key.as_bytes());
        self.rows
            .iter()
            .zip(hashes)
            .map(|(row, hash)| row[(hash & MASK) as usize])
            .min()
            .unwrap_or(0)
    }

    /// Total increments recorded so far.
    pub fn operations(&self) -> u64 {
        self.ops
    }

    /// Halves every counter.
    fn age(&mut self) {
        for counter in self.rows.iter_mut().flatten() {
            *counter >>= 1;
        }
    }
}

impl Default for FrequencySketch {
    fn default() -> Self {
        Self::new()
    }
}

/// Four FNV-style hashes with distinct seeds, offsets and multipliers so that
/// collisions in one row are unlikely to repeat in another.
fn hash_key(bytes: &[u8]) -> [u32; DEPTH] {
    let mut h1: u32 = 2_166_136_261;
    let mut h2: u32 = 33_554_467;
    let mut h3: u32 = 16_777_619;
    let mut h4: u32 = 1_013_904_223;
    for &b in bytes {
        let c = b as u32;
        h1 ^= c;
        h1 = h1.wrapping_mul(16_777_619);
        h2 ^= c.wrapping_add(0x9e37_79b9);
        h2 = h2.wrapping_mul(2_246_822_519);
        h3 ^= c.wrapping_add(0x85eb_ca6b);
        h3 = h3.wrapping_mul(3_266_489_917);
        h4 ^= c.wrapping_add(0xc2b2_ae35);
        h4 = h4.wrapping_mul(668_265_263);
    }
    [h1, h2, h3, h4]
}
