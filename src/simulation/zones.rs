//! Reversal zone detection
//!
//! Clusters surviving-path prices at a future time slice into contiguous
//! bands via a histogram over the price axis. Bands dense enough relative to
//! the peak bin become zones: the band holding the single highest-density
//! bin is the convergence zone, everything else is support below the current
//! observation price and resistance above it. Zones rank by probability,
//! ties going to the narrower band (tighter zones are more actionable).

use serde::{Deserialize, Serialize};

use crate::domain::zone::{ReversalZone, ZoneType};

/// Clustering knobs for the detector
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ZoneDetectorConfig {
    /// Histogram bins spanning the survivor price range
    pub num_bins: usize,
    /// Fraction of the peak bin count a bin needs to qualify
    pub density_floor: f64,
    /// Below this many survivors no clustering is attempted
    pub min_survivors: usize,
}

impl Default for ZoneDetectorConfig {
    fn default() -> Self {
        Self {
            num_bins: 50,
            density_floor: 0.3,
            min_survivors: 5,
        }
    }
}

/// Extracts ranked reversal zones from a survivor price slice
#[derive(Debug, Clone, Copy, Default)]
pub struct ZoneDetector {
    config: ZoneDetectorConfig,
}

impl ZoneDetector {
    pub fn new(config: ZoneDetectorConfig) -> Self {
        Self { config }
    }

    /// Detect zones among `prices` (survivor prices at one future offset),
    /// classified against the current observation price.
    ///
    /// Too few survivors is an empty result, not an error.
    pub fn detect(&self, prices: &[f64], observation_price: f64) -> Vec<ReversalZone> {
        let total = prices.len();
        if total < self.config.min_survivors {
            return Vec::new();
        }

        let min = prices.iter().cloned().fold(f64::INFINITY, f64::min);
        let max = prices.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

        // All survivors at one price: a single tight convergence band.
        if max <= min {
            return vec![ReversalZone {
                price_low: min,
                price_high: max,
                zone_type: ZoneType::Convergence,
                path_count: total,
                probability: 1.0,
            }];
        }

        let num_bins = self.config.num_bins.max(1);
        let width = (max - min) / num_bins as f64;
        let mut counts = vec![0usize; num_bins];
        for price in prices {
            let idx = (((price - min) / width) as usize).min(num_bins - 1);
            counts[idx] += 1;
        }

        let peak_bin = counts
            .iter()
            .enumerate()
            .max_by_key(|(_, c)| **c)
            .map(|(i, _)| i)
            .unwrap_or(0);
        let peak_count = counts[peak_bin];
        let threshold = (peak_count as f64 * self.config.density_floor).ceil() as usize;
        let qualifies =
            |count: usize| count >= threshold && count >= self.config.min_survivors;

        // Merge adjacent qualifying bins into contiguous bands.
        let mut zones = Vec::new();
        let mut bin = 0;
        while bin < num_bins {
            if !qualifies(counts[bin]) {
                bin += 1;
                continue;
            }
            let start = bin;
            let mut count = 0;
            while bin < num_bins && qualifies(counts[bin]) {
                count += counts[bin];
                bin += 1;
            }
            let end = bin; // one past the last qualifying bin

            let price_low = min + start as f64 * width;
            let price_high = min + end as f64 * width;
            let contains_peak = (start..end).contains(&peak_bin);
            let center = (price_low + price_high) / 2.0;

            let zone_type = if contains_peak {
                ZoneType::Convergence
            } else if center < observation_price {
                ZoneType::Support
            } else {
                ZoneType::Resistance
            };

            zones.push(ReversalZone {
                price_low,
                price_high,
                zone_type,
                path_count: count,
                probability: count as f64 / total as f64,
            });
        }

        rank_zones(&mut zones);
        zones
    }
}

/// Probability descending; ties broken by narrower band first
fn rank_zones(zones: &mut [ReversalZone]) {
    zones.sort_by(|a, b| {
        b.probability
            .partial_cmp(&a.probability)
            .unwrap_or(std::cmp::Ordering::Equal)
            .then_with(|| {
                a.width()
                    .partial_cmp(&b.width())
                    .unwrap_or(std::cmp::Ordering::Equal)
            })
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cluster(price: f64, count: usize) -> Vec<f64> {
        vec![price; count]
    }

    #[test]
    fn test_too_few_survivors_is_empty_not_error() {
        let detector = ZoneDetector::default();
        // 3 survivors against the default minimum of 5.
        assert!(detector.detect(&[99.0, 100.0, 101.0], 100.0).is_empty());
    }

    #[test]
    fn test_degenerate_slice_is_single_convergence() {
        let detector = ZoneDetector::default();
        let zones = detector.detect(&cluster(100.0, 8), 100.0);

        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].zone_type, ZoneType::Convergence);
        assert_eq!(zones[0].path_count, 8);
        assert_eq!(zones[0].probability, 1.0);
        assert_eq!(zones[0].width(), 0.0);
    }

    #[test]
    fn test_densest_cluster_is_convergence_others_positional() {
        let detector = ZoneDetector::default();
        let mut prices = cluster(90.0, 10);
        prices.extend(cluster(110.0, 6));

        let zones = detector.detect(&prices, 100.0);
        assert_eq!(zones.len(), 2);

        // Densest cluster first, marked convergence regardless of position.
        assert_eq!(zones[0].zone_type, ZoneType::Convergence);
        assert!(zones[0].price_low <= 90.0 && 90.0 <= zones[0].price_high);
        assert_eq!(zones[0].path_count, 10);
        assert_relative_eq!(zones[0].probability, 10.0 / 16.0, epsilon = 1e-12);

        // The sparser band sits above the observation: resistance.
        assert_eq!(zones[1].zone_type, ZoneType::Resistance);
        assert_eq!(zones[1].path_count, 6);
    }

    #[test]
    fn test_band_below_observation_is_support() {
        let detector = ZoneDetector::default();
        let mut prices = cluster(90.0, 6);
        prices.extend(cluster(110.0, 10));

        let zones = detector.detect(&prices, 100.0);
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].zone_type, ZoneType::Convergence);
        assert_eq!(zones[1].zone_type, ZoneType::Support);
        assert!(zones[1].center() < 100.0);
    }

    #[test]
    fn test_sparse_bins_below_floor_are_dropped() {
        let detector = ZoneDetector::new(ZoneDetectorConfig {
            num_bins: 10,
            density_floor: 0.5,
            min_survivors: 2,
        });
        // 20 at one level, 2 stragglers far away: 2 < 0.5 * 20.
        let mut prices = cluster(100.0, 20);
        prices.extend(cluster(150.0, 2));

        let zones = detector.detect(&prices, 120.0);
        assert_eq!(zones.len(), 1);
        assert_eq!(zones[0].path_count, 20);
    }

    #[test]
    fn test_adjacent_bins_merge_into_one_band() {
        let detector = ZoneDetector::new(ZoneDetectorConfig {
            num_bins: 4,
            density_floor: 0.2,
            min_survivors: 2,
        });
        // Range [100, 140], four bins of width 10. Survivors spread over the
        // two lowest bins plus an anchor in the top bin.
        let mut prices = vec![100.0, 104.0, 108.0, 112.0, 115.0, 119.0];
        prices.extend(cluster(140.0, 2));

        let zones = detector.detect(&prices, 130.0);
        // Bins 0 and 1 merge; the anchor bin stands alone.
        assert_eq!(zones.len(), 2);
        assert_eq!(zones[0].path_count, 6);
        assert_relative_eq!(zones[0].price_low, 100.0, epsilon = 1e-9);
        assert_relative_eq!(zones[0].price_high, 120.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ranking_probability_then_tighter_band() {
        let mut zones = vec![
            ReversalZone {
                price_low: 100.0,
                price_high: 120.0,
                zone_type: ZoneType::Resistance,
                path_count: 6,
                probability: 0.5,
            },
            ReversalZone {
                price_low: 80.0,
                price_high: 90.0,
                zone_type: ZoneType::Support,
                path_count: 6,
                probability: 0.5,
            },
            ReversalZone {
                price_low: 90.0,
                price_high: 100.0,
                zone_type: ZoneType::Convergence,
                path_count: 8,
                probability: 0.8,
            },
        ];
        rank_zones(&mut zones);

        assert_eq!(zones[0].zone_type, ZoneType::Convergence);
        // Equal probability: the 10-wide band beats the 20-wide one.
        assert_eq!(zones[1].width(), 10.0);
        assert_eq!(zones[2].width(), 20.0);
    }
}
