//! Latency jitter sources.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Produces the per-node offset added to a base latency on each tick.
///
/// Implementations must return a value in `0..=max`.
pub trait JitterSource: Send {
    fn offset(&mut self, max: u32) -> u32;
}

/// Uniform integer jitter backed by [`StdRng`].
#[derive(Debug)]
pub struct RandomJitter {
    rng: StdRng,
}

impl RandomJitter {
    /// Seeded from OS entropy.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Reproducible sequence for a given seed.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_seed_option(seed: Option<u64>) -> Self {
        match seed {
            Some(seed) => Self::seeded(seed),
            None => Self::from_entropy(),
        }
    }
}

impl JitterSource for RandomJitter {
    fn offset(&mut self, max: u32) -> u32 {
        self.rng.gen_range(0..=max)
    }
}

/// Always returns the same offset (clamped to `max`).
#[derive(Debug, Clone, Copy)]
pub struct FixedJitter(u32);

impl FixedJitter {
    pub fn new(offset: u32) -> Self {
        Self(offset)
    }
}

impl JitterSource for FixedJitter {
    fn offset(&mut self, max: u32) -> u32 {
        self.0.min(max)
    }
}
