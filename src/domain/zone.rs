//! Reversal zones
//!
//! A reversal zone is a contiguous price band where surviving paths cluster.
//! Zones are recomputed from scratch on every tick and never persisted.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classification of a zone relative to the current observation price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZoneType {
    /// Band below the current price with enough survivor density
    Support,
    /// Band above the current price with enough survivor density
    Resistance,
    /// Band containing the single highest-density cluster overall
    Convergence,
}

impl fmt::Display for ZoneType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ZoneType::Support => write!(f, "support"),
            ZoneType::Resistance => write!(f, "resistance"),
            ZoneType::Convergence => write!(f, "convergence"),
        }
    }
}

/// A price band where surviving paths cluster
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReversalZone {
    pub price_low: f64,
    pub price_high: f64,
    pub zone_type: ZoneType,
    /// Surviving paths inside the band
    pub path_count: usize,
    /// `path_count / total_survivors`
    pub probability: f64,
}

impl ReversalZone {
    /// Band width; ties in probability rank narrower zones first
    pub fn width(&self) -> f64 {
        self.price_high - self.price_low
    }

    /// Midpoint of the band
    pub fn center(&self) -> f64 {
        (self.price_low + self.price_high) / 2.0
    }
}
