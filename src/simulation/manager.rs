//! Path manager
//!
//! Exclusive owner of the live ensemble. The only component allowed to flip
//! path status: elimination is idempotent and monotonic (the alive set only
//! shrinks over a run), and `reset` swaps the whole ensemble so no stale
//! elimination state can leak into a reseeded run.

use statrs::statistics::{Data, OrderStatistics, Statistics};

use crate::domain::errors::SimulationError;
use crate::domain::path::{Ensemble, SimulatedPath};

/// Survivor distribution at one step offset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurvivorStats {
    pub mean: f64,
    pub p10: f64,
    pub p50: f64,
    pub p90: f64,
}

/// Owns one ensemble per run and tracks alive/eliminated status
#[derive(Debug)]
pub struct PathManager {
    ensemble: Ensemble,
}

impl PathManager {
    pub fn new(ensemble: Ensemble) -> Self {
        Self { ensemble }
    }

    /// Paths still alive
    pub fn survivors(&self) -> impl Iterator<Item = &SimulatedPath> {
        self.ensemble.paths().iter().filter(|p| p.alive)
    }

    pub fn survivor_count(&self) -> usize {
        self.survivors().count()
    }

    pub fn eliminated_count(&self) -> usize {
        self.ensemble.len() - self.survivor_count()
    }

    pub fn total_paths(&self) -> usize {
        self.ensemble.len()
    }

    pub fn num_steps(&self) -> u32 {
        self.ensemble.num_steps()
    }

    pub fn survival_rate(&self) -> f64 {
        if self.ensemble.is_empty() {
            0.0
        } else {
            self.survivor_count() as f64 / self.ensemble.len() as f64
        }
    }

    /// Mark a path dead at the given offset.
    ///
    /// Idempotent: a dead path stays dead with its original elimination
    /// offset, and unknown ids are ignored.
    pub fn eliminate(&mut self, path_id: u32, at_offset: u32) {
        if let Some(path) = self
            .ensemble
            .paths_mut()
            .iter_mut()
            .find(|p| p.id == path_id)
        {
            if path.alive {
                path.alive = false;
                path.eliminated_at = Some(at_offset);
            }
        }
    }

    /// Surviving paths' prices at one offset
    pub fn prices_at(&self, offset: u32) -> Vec<f64> {
        self.survivors()
            .filter_map(|p| p.price_at(offset))
            .collect()
    }

    /// Mean and percentile band of survivors at one offset.
    ///
    /// `NoSurvivors` when the alive set is empty - reportable, not fatal.
    pub fn survivor_statistics(&self, offset: u32) -> Result<SurvivorStats, SimulationError> {
        if self.survivor_count() == 0 {
            return Err(SimulationError::NoSurvivors);
        }
        if offset > self.ensemble.num_steps() {
            return Err(SimulationError::InvalidParameter(format!(
                "offset {offset} beyond horizon {}",
                self.ensemble.num_steps()
            )));
        }

        let prices = self.prices_at(offset);
        let mean = prices.iter().mean();
        let mut data = Data::new(prices);

        Ok(SurvivorStats {
            mean,
            p10: data.percentile(10),
            p50: data.percentile(50),
            p90: data.percentile(90),
        })
    }

    /// Mean survivor price at every offset, empty when no survivors
    pub fn mean_path(&self) -> Vec<f64> {
        if self.survivor_count() == 0 {
            return Vec::new();
        }
        (0..=self.ensemble.num_steps())
            .map(|k| self.prices_at(k).iter().mean())
            .collect()
    }

    /// Percentile envelope (lower, upper) at every offset
    pub fn percentile_band(&self, lower: usize, upper: usize) -> (Vec<f64>, Vec<f64>) {
        if self.survivor_count() == 0 {
            return (Vec::new(), Vec::new());
        }
        let mut lo = Vec::with_capacity(self.ensemble.num_steps() as usize + 1);
        let mut hi = Vec::with_capacity(self.ensemble.num_steps() as usize + 1);
        for k in 0..=self.ensemble.num_steps() {
            let mut data = Data::new(self.prices_at(k));
            lo.push(data.percentile(lower));
            hi.push(data.percentile(upper));
        }
        (lo, hi)
    }

    /// Replace the ensemble entirely. No partial-state carryover: every
    /// elimination flag dies with the old ensemble.
    pub fn reset(&mut self, ensemble: Ensemble) {
        self.ensemble = ensemble;
    }

    pub fn ensemble(&self) -> &Ensemble {
        &self.ensemble
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn manager(prices_per_path: &[&[f64]]) -> PathManager {
        let paths = prices_per_path
            .iter()
            .enumerate()
            .map(|(i, prices)| SimulatedPath::new(i as u32, prices.to_vec()))
            .collect();
        PathManager::new(Ensemble::new(paths))
    }

    #[test]
    fn test_all_paths_start_alive() {
        let mgr = manager(&[&[100.0, 101.0], &[100.0, 99.0], &[100.0, 100.5]]);
        assert_eq!(mgr.survivor_count(), 3);
        assert_eq!(mgr.eliminated_count(), 0);
        assert_eq!(mgr.survival_rate(), 1.0);
    }

    #[test]
    fn test_eliminate_is_idempotent_and_monotonic() {
        let mut mgr = manager(&[&[100.0, 101.0], &[100.0, 99.0]]);

        mgr.eliminate(0, 1);
        assert_eq!(mgr.survivor_count(), 1);

        // Repeat elimination at a later offset: no-op, original offset kept.
        mgr.eliminate(0, 5);
        assert_eq!(mgr.survivor_count(), 1);
        let dead = mgr
            .ensemble()
            .paths()
            .iter()
            .find(|p| p.id == 0)
            .unwrap();
        assert!(!dead.alive);
        assert_eq!(dead.eliminated_at, Some(1));

        // Unknown id is ignored.
        mgr.eliminate(99, 1);
        assert_eq!(mgr.survivor_count(), 1);
    }

    #[test]
    fn test_survivor_statistics() {
        let mgr = manager(&[
            &[100.0, 90.0],
            &[100.0, 100.0],
            &[100.0, 110.0],
        ]);

        let stats = mgr.survivor_statistics(1).unwrap();
        assert_relative_eq!(stats.mean, 100.0, epsilon = 1e-12);
        assert_eq!(stats.p50, 100.0);
        assert!(stats.p10 >= 90.0 && stats.p10 <= 100.0);
        assert!(stats.p90 >= 100.0 && stats.p90 <= 110.0);
    }

    #[test]
    fn test_statistics_ignore_eliminated_paths() {
        let mut mgr = manager(&[
            &[100.0, 50.0],
            &[100.0, 100.0],
            &[100.0, 102.0],
        ]);
        mgr.eliminate(0, 1);

        let stats = mgr.survivor_statistics(1).unwrap();
        assert_relative_eq!(stats.mean, 101.0, epsilon = 1e-12);
    }

    #[test]
    fn test_no_survivors_error() {
        let mut mgr = manager(&[&[100.0, 101.0], &[100.0, 99.0]]);
        mgr.eliminate(0, 1);
        mgr.eliminate(1, 1);

        assert_eq!(
            mgr.survivor_statistics(1),
            Err(SimulationError::NoSurvivors)
        );
        assert!(mgr.mean_path().is_empty());
        assert_eq!(mgr.survival_rate(), 0.0);
    }

    #[test]
    fn test_offset_beyond_horizon() {
        let mgr = manager(&[&[100.0, 101.0]]);
        assert!(matches!(
            mgr.survivor_statistics(2),
            Err(SimulationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_mean_path_and_band_shapes() {
        let mgr = manager(&[
            &[100.0, 101.0, 103.0],
            &[100.0, 99.0, 97.0],
        ]);

        let mean = mgr.mean_path();
        assert_eq!(mean, vec![100.0, 100.0, 100.0]);

        let (lo, hi) = mgr.percentile_band(10, 90);
        assert_eq!(lo.len(), 3);
        assert_eq!(hi.len(), 3);
        for (l, h) in lo.iter().zip(&hi) {
            assert!(l <= h);
        }
    }

    #[test]
    fn test_reset_discards_elimination_state() {
        let mut mgr = manager(&[&[100.0, 101.0], &[100.0, 99.0]]);
        mgr.eliminate(0, 1);
        assert_eq!(mgr.survivor_count(), 1);

        let fresh = Ensemble::new(vec![
            SimulatedPath::new(0, vec![200.0, 201.0]),
            SimulatedPath::new(1, vec![200.0, 199.0]),
            SimulatedPath::new(2, vec![200.0, 200.0]),
        ]);
        mgr.reset(fresh);

        assert_eq!(mgr.total_paths(), 3);
        assert_eq!(mgr.survivor_count(), 3);
        assert_eq!(mgr.eliminated_count(), 0);
    }
}
