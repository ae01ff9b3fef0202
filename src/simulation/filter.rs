//! Path elimination against live observations
//!
//! Each tick compares one observation to every surviving path at the single
//! nearest step offset and eliminates paths whose relative deviation exceeds
//! the tolerance. Past offsets are never re-checked, so elimination is
//! monotonic; re-running the same offset is a cheap no-op for already-dead
//! paths. Tolerance should scale with how fine the tick cadence is relative
//! to the step duration.

use std::time::Duration;

use crate::domain::errors::SimulationError;
use crate::domain::series::Observation;
use crate::simulation::estimator::Timeframe;
use crate::simulation::manager::PathManager;

/// Eliminates paths that diverge from observed prices
#[derive(Debug, Clone, Copy)]
pub struct PathFilter {
    /// Maximum allowed relative deviation, as a fraction of the observed price
    tolerance: f64,
}

impl PathFilter {
    /// The live config validates tolerance into (0, 1); the filter itself
    /// only requires a finite, non-negative value so the boundary cases
    /// stay testable.
    pub fn new(tolerance: f64) -> Result<Self, SimulationError> {
        if !(tolerance.is_finite() && tolerance >= 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "tolerance must be finite and >= 0, got {tolerance}"
            )));
        }
        Ok(Self { tolerance })
    }

    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Nearest step offset for a given elapsed time since run start
    pub fn offset_for(elapsed: Duration, timeframe: Timeframe) -> u32 {
        let step = timeframe.step().as_secs_f64();
        (elapsed.as_secs_f64() / step).round() as u32
    }

    /// Compare one observation against every surviving path at `offset` and
    /// eliminate the ones outside tolerance. Returns how many died.
    ///
    /// Offsets beyond the horizon are a warned no-op: paths are never
    /// evaluated retroactively, and a run past its horizon has nothing left
    /// to predict.
    pub fn apply(
        &self,
        manager: &mut PathManager,
        observation: &Observation,
        offset: u32,
    ) -> Result<usize, SimulationError> {
        if !(observation.price.is_finite() && observation.price > 0.0) {
            return Err(SimulationError::InvalidParameter(format!(
                "observation price must be positive, got {}",
                observation.price
            )));
        }
        if offset > manager.num_steps() {
            tracing::warn!(
                offset,
                horizon = manager.num_steps(),
                "observation beyond forecast horizon, skipping elimination"
            );
            return Ok(0);
        }

        let doomed: Vec<u32> = manager
            .survivors()
            .filter_map(|path| {
                let predicted = path.price_at(offset)?;
                let deviation = (predicted - observation.price).abs() / observation.price;
                (deviation > self.tolerance).then_some(path.id)
            })
            .collect();

        for id in &doomed {
            manager.eliminate(*id, offset);
        }

        Ok(doomed.len())
    }
}
