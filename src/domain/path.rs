//! Simulated paths and the ensemble that owns them
//!
//! A `SimulatedPath` is one discrete GBM trajectory: a price at every integer
//! step offset `0..=num_steps`. Prices are frozen at generation; only the
//! `alive`/`eliminated_at` status changes afterwards, and only through the
//! `PathManager`. The `Ensemble` owns the full set for one run and is created
//! and destroyed as a unit.

use std::sync::Arc;

/// One simulated GBM trajectory
#[derive(Debug, Clone)]
pub struct SimulatedPath {
    pub id: u32,
    /// Price at each step offset, `prices[k]` for offset `k` in `0..=T`
    prices: Arc<[f64]>,
    pub alive: bool,
    /// Step offset at which this path was eliminated, if it was
    pub eliminated_at: Option<u32>,
}

impl SimulatedPath {
    pub fn new(id: u32, prices: Vec<f64>) -> Self {
        Self {
            id,
            prices: prices.into(),
            alive: true,
            eliminated_at: None,
        }
    }

    /// Price at the given step offset, or `None` past the horizon
    pub fn price_at(&self, offset: u32) -> Option<f64> {
        self.prices.get(offset as usize).copied()
    }

    /// All prices, offsets `0..=num_steps`
    pub fn prices(&self) -> &[f64] {
        &self.prices
    }

    /// Number of steps T (offsets run `0..=T`)
    pub fn num_steps(&self) -> u32 {
        (self.prices.len() as u32).saturating_sub(1)
    }
}

/// The full set of simulated paths for one run
///
/// Invariants: path ids are unique, and every path holds a price at every
/// offset `0..=num_steps` (all paths the same length).
#[derive(Debug, Clone)]
pub struct Ensemble {
    paths: Vec<SimulatedPath>,
    num_steps: u32,
}

impl Ensemble {
    /// Assemble an ensemble from freshly generated paths.
    ///
    /// Callers (the path generator) are responsible for unique ids and
    /// aligned offsets; both are debug-asserted here.
    pub fn new(paths: Vec<SimulatedPath>) -> Self {
        let num_steps = paths.first().map(|p| p.num_steps()).unwrap_or(0);
        debug_assert!(paths.iter().all(|p| p.num_steps() == num_steps));
        debug_assert!({
            let mut ids: Vec<u32> = paths.iter().map(|p| p.id).collect();
            ids.sort_unstable();
            ids.windows(2).all(|w| w[0] != w[1])
        });
        Self { paths, num_steps }
    }

    pub fn paths(&self) -> &[SimulatedPath] {
        &self.paths
    }

    pub(crate) fn paths_mut(&mut self) -> &mut [SimulatedPath] {
        &mut self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn num_steps(&self) -> u32 {
        self.num_steps
    }
}
