use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Source of independent uniform pairs in [0, 1) x [0, 1). The contract
/// requires uniformity and independence, not a particular generator.
pub trait Sampler2D {
    fn next_2d(&mut self) -> DVec2;
}

/// Default sampler backed by any `rand` generator.
pub struct RngSampler<R: Rng> {
    rng: R,
}

impl RngSampler<StdRng> {
    pub fn seeded(seed: u64) -> Self {
        RngSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        RngSampler {
            rng: StdRng::from_entropy(),
        }
    }
}

impl<R: Rng> RngSampler<R> {
    pub fn new(rng: R) -> Self {
        RngSampler { rng }
    }
}

impl<R: Rng> Sampler2D for RngSampler<R> {
    fn next_2d(&mut self) -> DVec2 {
        DVec2::new(self.rng.gen::<f64>(), self.rng.gen::<f64>())
    }
}

#[cfg(test)]
pub struct FixedSampler(pub DVec2);

#[cfg(test)]
impl Sampler2D for FixedSampler {
    fn next_2d(&mut self) -> DVec2 {
        self.0
    }
}
