//! Seeded random streams.
//!
//! Every consumer draws from its own named stream derived from the scenario
//! seed, so adding draws to one consumer never shifts another's sequence.

use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Stream feeding vegetation growth on turn start.
pub const GROWTH_STREAM: &str = "growth";

pub struct RngManager {
    seed: u64,
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Streams are derived from the master in first-use order.
    pub fn stream(&mut self, name: &str) -> StreamRng<'_> {
        let master = &mut self.master;
        let inner = self.streams.entry(name.to_string()).or_insert_with(|| {
            let derived = master.next_u64();
            tracing::trace!(stream = name, derived, "rng stream created");
            ChaCha8Rng::seed_from_u64(derived)
        });
        StreamRng { inner }
    }
}

/// Borrowed handle to one named stream.
pub struct StreamRng<'a> {
    inner: &'a mut ChaCha8Rng,
}

impl RngCore for StreamRng<'_> {
    fn next_u32(&mut self) -> u32 {
        self.inner.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.inner.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.inner.fill_bytes(dest);
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.inner.try_fill_bytes(dest)
    }
}
