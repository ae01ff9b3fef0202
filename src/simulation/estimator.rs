//! GBM parameter estimation
//!
//! Derives annualized drift (mu) and volatility (sigma) from a historical
//! price series at a chosen sampling timeframe:
//!
//! - r_i = ln(P_i / P_{i-1})
//! - mu = mean(r) * periods_per_year
//! - sigma = sample_std(r) * sqrt(periods_per_year)
//!
//! Annualization uses trading time (252 days x 6.5 hours), matching the
//! intraday sampling the live engine runs at. A constant series estimates
//! sigma = 0, which is valid and flows through to deterministic drift paths.

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::domain::errors::SimulationError;
use crate::domain::series::PriceSeries;

/// Trading days per year
const TRADING_DAYS_PER_YEAR: f64 = 252.0;
/// Regular-session trading hours per day
const TRADING_HOURS_PER_DAY: f64 = 6.5;

/// Sampling timeframe of a price series
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Timeframe {
    #[serde(rename = "1d")]
    Day1,
    #[serde(rename = "4h")]
    Hour4,
    #[serde(rename = "1h")]
    Hour1,
    #[serde(rename = "15m")]
    Min15,
    #[serde(rename = "5m")]
    Min5,
    #[serde(rename = "1m")]
    Min1,
}

impl Timeframe {
    /// Higher timeframes used for parameter estimation, coarsest first
    pub const HTF: [Timeframe; 3] = [Timeframe::Day1, Timeframe::Hour4, Timeframe::Hour1];

    /// Sampling periods per trading year, used for annualization
    pub fn periods_per_year(self) -> f64 {
        let trading_hours = TRADING_DAYS_PER_YEAR * TRADING_HOURS_PER_DAY;
        match self {
            Timeframe::Day1 => TRADING_DAYS_PER_YEAR,
            Timeframe::Hour4 => trading_hours / 4.0,
            Timeframe::Hour1 => trading_hours,
            Timeframe::Min15 => trading_hours * 4.0,
            Timeframe::Min5 => trading_hours * 12.0,
            Timeframe::Min1 => trading_hours * 60.0,
        }
    }

    /// One sampling period expressed in trading years
    pub fn dt_years(self) -> f64 {
        1.0 / self.periods_per_year()
    }

    /// Wall-clock duration of one step, used to map elapsed time to offsets
    pub fn step(self) -> Duration {
        match self {
            Timeframe::Day1 => Duration::from_secs(24 * 3600),
            Timeframe::Hour4 => Duration::from_secs(4 * 3600),
            Timeframe::Hour1 => Duration::from_secs(3600),
            Timeframe::Min15 => Duration::from_secs(15 * 60),
            Timeframe::Min5 => Duration::from_secs(5 * 60),
            Timeframe::Min1 => Duration::from_secs(60),
        }
    }

    /// How many steps of `base` make up one step of `self`, if whole
    pub fn stride_over(self, base: Timeframe) -> Option<usize> {
        let own = self.step().as_secs();
        let fine = base.step().as_secs();
        if own >= fine && own % fine == 0 {
            Some((own / fine) as usize)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Timeframe::Day1 => "1d",
            Timeframe::Hour4 => "4h",
            Timeframe::Hour1 => "1h",
            Timeframe::Min15 => "15m",
            Timeframe::Min5 => "5m",
            Timeframe::Min1 => "1m",
        }
    }
}

impl fmt::Display for Timeframe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Timeframe {
    type Err = SimulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "1d" => Ok(Timeframe::Day1),
            "4h" => Ok(Timeframe::Hour4),
            "1h" => Ok(Timeframe::Hour1),
            "15m" => Ok(Timeframe::Min15),
            "5m" => Ok(Timeframe::Min5),
            "1m" => Ok(Timeframe::Min1),
            other => Err(SimulationError::InvalidParameter(format!(
                "unknown timeframe '{other}' (expected 1d, 4h, 1h, 15m, 5m or 1m)"
            ))),
        }
    }
}

/// Estimated GBM parameters for one estimation window
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelParameters {
    /// Annualized drift
    pub mu: f64,
    /// Annualized volatility, always >= 0
    pub sigma: f64,
    /// Sampling timeframe the estimate was made at
    pub timeframe: Timeframe,
}

/// Stateless estimator over immutable price series
pub struct ParameterEstimator;

impl ParameterEstimator {
    /// Estimate annualized mu/sigma from a series sampled at `timeframe`.
    ///
    /// Needs at least 2 points. All prices must be positive (log returns).
    pub fn estimate(
        series: &PriceSeries,
        timeframe: Timeframe,
    ) -> Result<ModelParameters, SimulationError> {
        if series.len() < 2 {
            return Err(SimulationError::InsufficientData {
                required: 2,
                got: series.len(),
            });
        }

        let prices = series.prices();
        if let Some(bad) = prices.iter().find(|p| **p <= 0.0 || !p.is_finite()) {
            return Err(SimulationError::InvalidParameter(format!(
                "price series contains non-positive price {bad}"
            )));
        }

        let returns: Vec<f64> = prices.windows(2).map(|w| (w[1] / w[0]).ln()).collect();

        let periods = timeframe.periods_per_year();
        let mu = returns.iter().mean() * periods;
        // A single return carries no dispersion; sample std needs n >= 2.
        let sigma = if returns.len() < 2 {
            0.0
        } else {
            returns.iter().std_dev() * periods.sqrt()
        };

        Ok(ModelParameters { mu, sigma, timeframe })
    }

    /// Estimate parameters across several timeframes by downsampling one
    /// base series. Timeframes whose downsampled view is too short are
    /// skipped rather than failing the whole pass.
    pub fn estimate_multi(
        base: &PriceSeries,
        base_timeframe: Timeframe,
        targets: &[Timeframe],
    ) -> Vec<(Timeframe, ModelParameters)> {
        let mut out = Vec::new();
        for &target in targets {
            let Some(stride) = target.stride_over(base_timeframe) else {
                tracing::debug!(
                    "skipping {target}: not a whole multiple of base {base_timeframe}"
                );
                continue;
            };
            let coarse = base.downsample(stride);
            match Self::estimate(&coarse, target) {
                Ok(params) => out.push((target, params)),
                Err(e) => {
                    tracing::debug!("skipping {target}: {e}");
                }
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::series::PricePoint;
    use approx::assert_relative_eq;
    use chrono::{TimeZone, Utc};

    fn series(prices: &[f64], step_secs: i64) -> PriceSeries {
        let points = prices
            .iter()
            .enumerate()
            .map(|(i, p)| PricePoint {
                timestamp: Utc.timestamp_opt(i as i64 * step_secs, 0).unwrap(),
                price: *p,
            })
            .collect();
        PriceSeries::new(points).unwrap()
    }

    #[test]
    fn test_insufficient_data() {
        let empty = series(&[], 60);
        assert!(matches!(
            ParameterEstimator::estimate(&empty, Timeframe::Min1),
            Err(SimulationError::InsufficientData { required: 2, got: 0 })
        ));

        let single = series(&[100.0], 60);
        assert!(matches!(
            ParameterEstimator::estimate(&single, Timeframe::Min1),
            Err(SimulationError::InsufficientData { required: 2, got: 1 })
        ));
    }

    #[test]
    fn test_rejects_non_positive_prices() {
        let bad = series(&[100.0, 0.0, 101.0], 60);
        assert!(matches!(
            ParameterEstimator::estimate(&bad, Timeframe::Min1),
            Err(SimulationError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_constant_series_yields_zero_sigma() {
        let flat = series(&[100.0; 50], 60);
        let params = ParameterEstimator::estimate(&flat, Timeframe::Min1).unwrap();
        assert_eq!(params.mu, 0.0);
        assert_eq!(params.sigma, 0.0);
    }

    #[test]
    fn test_two_points_yields_zero_sigma() {
        // One log return, no dispersion to measure.
        let two = series(&[100.0, 110.0], 86400);
        let params = ParameterEstimator::estimate(&two, Timeframe::Day1).unwrap();
        assert_relative_eq!(params.mu, (1.1f64).ln() * 252.0, epsilon = 1e-9);
        assert_eq!(params.sigma, 0.0);
    }

    #[test]
    fn test_known_daily_estimate() {
        // Log returns +ln(1.1), -ln(1.1): mu = 0, sample std = ln(1.1)*sqrt(2).
        let prices = series(&[100.0, 110.0, 100.0], 86400);
        let params = ParameterEstimator::estimate(&prices, Timeframe::Day1).unwrap();

        assert_relative_eq!(params.mu, 0.0, epsilon = 1e-12);
        let expected_sigma = (1.1f64).ln() * (2.0f64).sqrt() * (252.0f64).sqrt();
        assert_relative_eq!(params.sigma, expected_sigma, epsilon = 1e-9);
    }

    #[test]
    fn test_annualization_factors() {
        assert_eq!(Timeframe::Day1.periods_per_year(), 252.0);
        assert_eq!(Timeframe::Hour1.periods_per_year(), 252.0 * 6.5);
        assert_eq!(Timeframe::Min1.periods_per_year(), 252.0 * 6.5 * 60.0);
        assert_relative_eq!(
            Timeframe::Min1.dt_years(),
            1.0 / (252.0 * 6.5 * 60.0),
            epsilon = 1e-15
        );
    }

    #[test]
    fn test_timeframe_round_trip() {
        for tf in [
            Timeframe::Day1,
            Timeframe::Hour4,
            Timeframe::Hour1,
            Timeframe::Min15,
            Timeframe::Min5,
            Timeframe::Min1,
        ] {
            assert_eq!(tf.as_str().parse::<Timeframe>().unwrap(), tf);
        }
        assert!("2h".parse::<Timeframe>().is_err());
    }

    #[test]
    fn test_stride_over() {
        assert_eq!(Timeframe::Hour1.stride_over(Timeframe::Min1), Some(60));
        assert_eq!(Timeframe::Day1.stride_over(Timeframe::Hour4), Some(6));
        assert_eq!(Timeframe::Min1.stride_over(Timeframe::Hour1), None);
    }

    #[test]
    fn test_estimate_multi_skips_short_views() {
        // 120 one-minute samples: enough for 1h (2 points after striding)
        // but not for 4h or 1d.
        let prices: Vec<f64> = (0..120).map(|i| 100.0 + i as f64 * 0.01).collect();
        let base = series(&prices, 60);

        let params =
            ParameterEstimator::estimate_multi(&base, Timeframe::Min1, &Timeframe::HTF);

        let frames: Vec<Timeframe> = params.iter().map(|(tf, _)| *tf).collect();
        assert!(frames.contains(&Timeframe::Hour1));
        assert!(!frames.contains(&Timeframe::Day1));
    }
}
