//! Deterministic RNG for synthetic scenario generation.
//!
//! The pipeline itself is fully deterministic and never draws random
//! numbers.  Demo and test scenarios (synthetic traffic, activity schedules)
//! do, and must be reproducible from a single seed, so they go through
//! `ScenarioRng` rather than thread-local entropy.
//!
//! Child generators are derived from the root seed alone:
//!
//!   seed = root_seed XOR ((offset + 1) * MIXING_CONSTANT)
//!
//! with the 64-bit fractional golden-ratio constant.  A child depends only on
//! its offset, never on how many other children were derived or in which
//! order, so one child per iteration or per person stays stable when others
//! are added.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

/// 64-bit fractional golden-ratio constant for seed mixing.
const MIXING_CONSTANT: u64 = 0x9e37_79b9_7f4a_7c15;

/// Seeded scenario RNG.
pub struct ScenarioRng {
    seed: u64,
    rng:  SmallRng,
}

impl ScenarioRng {
    pub fn new(seed: u64) -> Self {
        ScenarioRng { seed, rng: SmallRng::seed_from_u64(seed) }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Derive a child `ScenarioRng` keyed by `offset`.  Does not advance
    /// this generator.
    pub fn child(&self, offset: u64) -> ScenarioRng {
        ScenarioRng::new(self.seed ^ offset.wrapping_add(1).wrapping_mul(MIXING_CONSTANT))
    }

    #[inline]
    pub fn inner(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    #[inline]
    pub fn gen_range<T, R>(&mut self, range: R) -> T
    where
        T: rand::distributions::uniform::SampleUniform,
        R: rand::distributions::uniform::SampleRange<T>,
    {
        self.rng.gen_range(range)
    }

    /// `true` with probability `p` (clamped to [0, 1]).
    #[inline]
    pub fn gen_bool(&mut self, p: f64) -> bool {
        self.rng.gen_bool(p.clamp(0.0, 1.0))
    }

    /// Choose a random element from a slice; `None` if it is empty.
    #[inline]
    pub fn choose<'a, T>(&mut self, slice: &'a [T]) -> Option<&'a T> {
        use rand::seq::SliceRandom;
        slice.choose(&mut self.rng)
    }
}
