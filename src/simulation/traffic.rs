use crate::config::MAX_SAMPLE;
use crate::simulation::SignalSource;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Uniform "network activity" in `0..=99`, independent across calls.
pub struct UniformActivity {
    rng: StdRng,
}

impl UniformActivity {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_rng(&mut rand::rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl Default for UniformActivity {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalSource for UniformActivity {
    fn name(&self) -> &str {
        "Uniform Activity"
    }

    fn next_sample(&mut self) -> u8 {
        self.rng.random_range(0..=MAX_SAMPLE)
    }
}
