//! Noise source for the signal model
//!
//! Uniform noise and spike decisions with optional deterministic seeding.

use rand::prelude::*;
use rand::rngs::SmallRng;
use rand_distr::{Distribution, Uniform};

/// Noise generator with configurable seed for reproducibility
#[derive(Clone)]
pub struct NoiseGenerator {
    rng: SmallRng,
    unit: Uniform<f64>,
}

impl NoiseGenerator {
    /// Create a new noise generator
    ///
    /// If seed is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self {
            rng,
            unit: Uniform::new(0.0, 1.0),
        }
    }

    /// Uniform random in [0, 1)
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        self.unit.sample(&mut self.rng)
    }

    /// Uniform random in [-half_width, half_width)
    #[inline]
    pub fn symmetric(&mut self, half_width: f64) -> f64 {
        if half_width == 0.0 {
            return 0.0;
        }
        (self.uniform() * 2.0 - 1.0) * half_width
    }

    /// Returns true with given probability
    #[inline]
    pub fn chance(&mut self, probability: f64) -> bool {
        self.uniform() < probability
    }

    /// Fair coin flip
    #[inline]
    pub fn coin(&mut self) -> bool {
        self.chance(0.5)
    }
}
