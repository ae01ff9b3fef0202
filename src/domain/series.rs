//! Price series and observations
//!
//! A `PriceSeries` is the immutable input to parameter estimation: an ordered
//! run of (timestamp, price) pairs with strictly increasing timestamps. An
//! `Observation` is a single live tick supplied by the data collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::errors::SimulationError;

/// One (timestamp, price) sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PricePoint {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// A single live market tick, read-only to the core
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub timestamp: DateTime<Utc>,
    pub price: f64,
}

/// Ordered historical price series, immutable once constructed
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    points: Vec<PricePoint>,
}

impl PriceSeries {
    /// Build a series, enforcing strictly increasing timestamps
    pub fn new(points: Vec<PricePoint>) -> Result<Self, SimulationError> {
        for pair in points.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(SimulationError::InvalidParameter(format!(
                    "price series timestamps must be strictly increasing ({} then {})",
                    pair[0].timestamp, pair[1].timestamp
                )));
            }
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[PricePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Close prices in timestamp order
    pub fn prices(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.price).collect()
    }

    /// Last sample of the series, if any
    pub fn last(&self) -> Option<&PricePoint> {
        self.points.last()
    }

    /// Coarser view of the same series: every `stride`-th point, trailing
    /// partial period dropped.
    ///
    /// Used to derive higher-timeframe series from a base series for
    /// multi-timeframe parameter estimation.
    pub fn downsample(&self, stride: usize) -> Self {
        if stride <= 1 {
            return self.clone();
        }
        let points: Vec<PricePoint> = self.points.iter().copied().step_by(stride).collect();
        // Striding from index 0 keeps order, so no re-validation needed.
        Self { points }
    }
}
