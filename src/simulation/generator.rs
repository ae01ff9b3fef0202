//! Monte Carlo GBM path generation
//!
//! Radiates an ensemble of N independent discrete-time GBM trajectories from
//! one starting price. Each path draws from its own `StdRng` keyed by
//! (run seed, path id), so the ensemble is bit-identical for a given seed and
//! shape no matter how or in what order paths are produced.
//!
//! Prices use the closed form over the cumulative Brownian sum
//! `W_k = Z_1 + .. + Z_k`:
//!
//! `S_k = S0 * exp((mu - sigma^2/2) * dt * k + sigma * sqrt(dt) * W_k)`
//!
//! With sigma = 0 the diffusion term vanishes and every offset is exactly
//! `S0 * exp(mu * dt * k)`.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use statrs::distribution::Normal;

use crate::domain::errors::SimulationError;
use crate::domain::path::{Ensemble, SimulatedPath};
use crate::simulation::estimator::Timeframe;

/// Odd constant from splitmix64, decorrelates per-path seeds
const SEED_MIX: u64 = 0x9E37_79B9_7F4A_7C15;

/// Generates one ensemble of seeded GBM paths
#[derive(Debug, Clone)]
pub struct PathGenerator {
    starting_price: f64,
    mu: f64,
    sigma: f64,
    num_paths: u32,
    num_steps: u32,
    timeframe: Timeframe,
    seed: u64,
}

impl PathGenerator {
    pub fn new(
        starting_price: f64,
        mu: f64,
        sigma: f64,
        num_paths: u32,
        num_steps: u32,
        timeframe: Timeframe,
        seed: u64,
    ) -> Result<Self, SimulationError> {
        if !(starting_price.is_finite() && starting_price > 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "starting price must be positive, got {starting_price}"
            )));
        }
        if !mu.is_finite() {
            return Err(SimulationError::InvalidParameter(format!(
                "drift must be finite, got {mu}"
            )));
        }
        if !(sigma.is_finite() && sigma >= 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "volatility must be >= 0, got {sigma}"
            )));
        }
        if num_paths < 1 {
            return Err(SimulationError::InvalidParameter(
                "num_paths must be >= 1".to_string(),
            ));
        }
        if num_steps < 1 {
            return Err(SimulationError::InvalidParameter(
                "num_steps must be >= 1".to_string(),
            ));
        }

        Ok(Self {
            starting_price,
            mu,
            sigma,
            num_paths,
            num_steps,
            timeframe,
            seed,
        })
    }

    /// Generate the full ensemble, all paths initially alive
    pub fn generate(&self) -> Result<Ensemble, SimulationError> {
        let standard_normal = Normal::new(0.0, 1.0).map_err(|e| {
            SimulationError::InvalidParameter(format!("normal distribution: {e}"))
        })?;

        let dt = self.timeframe.dt_years();
        let drift_per_step = (self.mu - 0.5 * self.sigma * self.sigma) * dt;
        let diffusion_scale = self.sigma * dt.sqrt();

        let paths = (0..self.num_paths)
            .map(|id| {
                let mut rng = self.path_rng(id);
                let mut prices = Vec::with_capacity(self.num_steps as usize + 1);
                prices.push(self.starting_price);

                let mut brownian_sum = 0.0;
                for k in 1..=self.num_steps {
                    let z: f64 = rng.sample(standard_normal);
                    brownian_sum += z;
                    let log_growth =
                        drift_per_step * f64::from(k) + diffusion_scale * brownian_sum;
                    prices.push(self.starting_price * log_growth.exp());
                }

                SimulatedPath::new(id, prices)
            })
            .collect();

        Ok(Ensemble::new(paths))
    }

    /// Dedicated deterministic stream for one path
    fn path_rng(&self, path_id: u32) -> StdRng {
        let keyed = self
            .seed
            .wrapping_add(u64::from(path_id).wrapping_mul(SEED_MIX));
        StdRng::seed_from_u64(keyed)
    }
}
