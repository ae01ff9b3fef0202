//! Live snapshots
//!
//! The single externally-exposed read model. One immutable `LiveSnapshot` is
//! produced per tick and handed to the renderer; the `status` field is what
//! keeps a trader from being misled by silently stale output: a reused
//! snapshot says `Stale`, a rebuilt ensemble says `Reseeded`.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::path::SimulatedPath;
use crate::domain::series::Observation;
use crate::domain::zone::ReversalZone;

/// What happened on the tick that produced a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TickStatus {
    /// Fresh observation processed, ensemble filtered
    Updated,
    /// Observation fetch failed or timed out; previous state re-issued
    Stale,
    /// Every path eliminated; a reseed follows on the next tick
    Stalled,
    /// Ensemble was rebuilt from the latest observation this tick
    Reseeded,
}

/// Per-offset percentile envelope over the surviving paths
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfidenceBand {
    /// 10th percentile at each offset
    pub lower: Vec<f64>,
    /// 90th percentile at each offset
    pub upper: Vec<f64>,
}

/// Immutable per-tick read model handed to the renderer
#[derive(Debug, Clone)]
pub struct LiveSnapshot {
    pub as_of: DateTime<Utc>,
    pub status: TickStatus,
    /// The observation driving this tick, absent on a missed tick
    pub observation: Option<Observation>,
    /// Clones of the surviving paths (price storage is shared, clones are cheap)
    pub surviving_paths: Vec<SimulatedPath>,
    pub surviving_count: usize,
    pub eliminated_count: usize,
    pub total_paths: usize,
    /// Mean survivor price at each offset
    pub mean_path: Vec<f64>,
    pub confidence_band: ConfidenceBand,
    /// Ranked zones, highest probability first
    pub zones: Vec<ReversalZone>,
    /// How many times this run has been reseeded so far
    pub reseed_count: u32,
}

impl LiveSnapshot {
    pub fn survival_rate(&self) -> f64 {
        if self.total_paths == 0 {
            0.0
        } else {
            self.surviving_count as f64 / self.total_paths as f64
        }
    }

    /// Serializable digest for JSON renderers; drops the per-path data
    pub fn summary(&self) -> SnapshotSummary {
        SnapshotSummary {
            as_of: self.as_of,
            status: self.status,
            price: self.observation.map(|o| o.price),
            surviving: self.surviving_count,
            eliminated: self.eliminated_count,
            total: self.total_paths,
            survival_rate: self.survival_rate(),
            zones: self.zones.clone(),
            reseed_count: self.reseed_count,
        }
    }
}

/// JSON-friendly digest of a snapshot
#[derive(Debug, Clone, Serialize)]
pub struct SnapshotSummary {
    pub as_of: DateTime<Utc>,
    pub status: TickStatus,
    pub price: Option<f64>,
    pub surviving: usize,
    pub eliminated: usize,
    pub total: usize,
    pub survival_rate: f64,
    pub zones: Vec<ReversalZone>,
    pub reseed_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::zone::ZoneType;

    fn snapshot(surviving: usize, total: usize) -> LiveSnapshot {
        LiveSnapshot {
            as_of: Utc::now(),
            status: TickStatus::Updated,
            observation: None,
            surviving_paths: vec![],
            surviving_count: surviving,
            eliminated_count: total - surviving,
            total_paths: total,
            mean_path: vec![],
            confidence_band: ConfidenceBand { lower: vec![], upper: vec![] },
            zones: vec![],
            reseed_count: 0,
        }
    }

    #[test]
    fn test_survival_rate() {
        assert_eq!(snapshot(250, 500).survival_rate(), 0.5);
        assert_eq!(snapshot(0, 0).survival_rate(), 0.0);
    }

    #[test]
    fn test_summary_serializes() {
        let mut snap = snapshot(3, 4);
        snap.zones.push(ReversalZone {
            price_low: 99.0,
            price_high: 100.0,
            zone_type: ZoneType::Support,
            path_count: 2,
            probability: 0.5,
        });
        let json = serde_json::to_string(&snap.summary()).unwrap();
        assert!(json.contains("\"status\":\"updated\""));
        assert!(json.contains("\"zone_type\":\"support\""));
    }
}
