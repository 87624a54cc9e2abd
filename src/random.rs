//! Injectable random source for the simulation

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform index sampler
pub trait RandomSource: Send {
    /// Uniform index in `0..len`. Callers never pass `len == 0`.
    fn index(&mut self, len: usize) -> usize;
}

/// `RandomSource` backed by a `StdRng`
#[derive(Debug, Clone)]
pub struct SystemRandom(StdRng);

impl SystemRandom {
    pub fn new() -> Self {
        Self(StdRng::from_entropy())
    }

    /// Reproducible sequence for a given seed
    pub fn seeded(seed: u64) -> Self {
        Self(StdRng::seed_from_u64(seed))
    }
}

impl Default for SystemRandom {
    fn default() -> Self {
        Self::new()
    }
}

impl RandomSource for SystemRandom {
    fn index(&mut self, len: usize) -> usize {
        self.0.gen_range(0..len)
    }
}
