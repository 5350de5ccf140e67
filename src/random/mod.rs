//! The single source of randomness for a run.
//!
//! Every draw in the simulation comes from one [`SimulationRng`], seeded once before the
//! population is built, so a seed and a set of parameters fully determine a run.
use log::trace;
use rand::distr::uniform::{SampleRange, SampleUniform};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// The seed used when none is given on the command line.
pub const DEFAULT_SEED: u64 = 42;

pub struct SimulationRng {
    base_seed: u64,
    rng: StdRng,
}

impl SimulationRng {
    #[must_use]
    pub fn new(base_seed: u64) -> Self {
        trace!("initializing random module (seed={base_seed})");
        SimulationRng {
            base_seed,
            rng: StdRng::seed_from_u64(base_seed),
        }
    }

    #[must_use]
    pub fn base_seed(&self) -> u64 {
        self.base_seed
    }

    /// Gets a random sample within the range provided by `range`.
    pub fn sample_range<S, T>(&mut self, range: S) -> T
    where
        S: SampleRange<T>,
        T: SampleUniform,
    {
        self.rng.random_range(range)
    }

    /// Draws uniformly from [0, 1).
    pub fn sample_uniform(&mut self) -> f64 {
        self.rng.random::<f64>()
    }

    /// Returns true when a uniform draw from [0, 1) falls below `p`. A `p` of 0 is never true
    /// and a `p` of 1 is always true.
    pub fn sample_bool(&mut self, p: f64) -> bool {
        self.sample_uniform() < p
    }
}

impl Default for SimulationRng {
    fn default() -> Self {
        SimulationRng::new(DEFAULT_SEED)
    }
}
