//! Deterministic random number streams.
//!
//! Every random decision in the AI layer draws from a named stream whose
//! seed is derived from the master seed, so a simulation replays exactly
//! for a given scenario seed. Each stream is seeded on first use; since
//! the tick loop itself is deterministic, so is the seeding order.

use std::collections::HashMap;

use rand::{RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

pub struct RngManager {
    master: ChaCha8Rng,
    streams: HashMap<String, ChaCha8Rng>,
}

impl RngManager {
    pub fn new(seed: u64) -> Self {
        Self {
            master: ChaCha8Rng::seed_from_u64(seed),
            streams: HashMap::new(),
        }
    }

    /// Gets (creating on first use) the stream with the given name.
    pub fn stream(&mut self, name: &str) -> &mut ChaCha8Rng {
        let master = &mut self.master;
        self.streams
            .entry(name.to_string())
            .or_insert_with(|| ChaCha8Rng::seed_from_u64(master.next_u64()))
    }
}
