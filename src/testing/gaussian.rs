use std::f64::consts::TAU;

use rand::Rng;
use rand::SeedableRng;
use rand::rngs::StdRng;

/// Seeded stream of Normal(loc, scale) samples.
///
/// Box-Muller over a deterministic generator, so a given seed always
/// reproduces the same sequence.
#[derive(Debug, Clone)]
pub struct GaussianSource {
    rng: StdRng,
    loc: f64,
    scale: f64,
    spare: Option<f64>,
}

impl GaussianSource {
    pub fn new(loc: f64, scale: f64, seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            loc,
            scale,
            spare: None,
        }
    }

    fn standard(&mut self) -> f64 {
        if let Some(z) = self.spare.take() {
            return z;
        }
        let u: f64 = self.rng.random_range(f64::MIN_POSITIVE..1.0);
        let theta: f64 = self.rng.random_range(0.0..TAU);
        let r = (-2.0 * u.ln()).sqrt();
        self.spare = Some(r * theta.sin());
        r * theta.cos()
    }

    pub fn sample(&mut self) -> f64 {
        self.loc + self.scale * self.standard()
    }

    pub fn take(&mut self, n: usize) -> Vec<f64> {
        (0..n).map(|_| self.sample()).collect()
    }
}
