//! Session-open resolution
//!
//! Where a simulation run anchors its starting price. Consulted exactly once,
//! at initialization; reseeds anchor on the latest observation instead.

use async_trait::async_trait;

use crate::domain::errors::SimulationError;
use crate::ports::market_data::DataError;

/// How the starting price S0 is chosen
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartingPriceMode {
    /// Open of the current trading week
    WeeklyOpen,
    /// Open of the current trading day
    DailyOpen,
    /// Operator-supplied price
    Explicit(f64),
}

impl StartingPriceMode {
    /// Parse the configuration surface's mode string. `explicit` needs the
    /// accompanying price, validated positive.
    pub fn parse(mode: &str, explicit_price: Option<f64>) -> Result<Self, SimulationError> {
        match mode {
            "weekly-open" => Ok(StartingPriceMode::WeeklyOpen),
            "daily-open" => Ok(StartingPriceMode::DailyOpen),
            "explicit" => match explicit_price {
                Some(price) if price > 0.0 && price.is_finite() => {
                    Ok(StartingPriceMode::Explicit(price))
                }
                Some(price) => Err(SimulationError::InvalidParameter(format!(
                    "explicit starting price must be positive, got {price}"
                ))),
                None => Err(SimulationError::InvalidParameter(
                    "starting_price_mode = \"explicit\" requires starting_price".to_string(),
                )),
            },
            other => Err(SimulationError::InvalidParameter(format!(
                "unknown starting_price_mode '{other}' \
                 (expected weekly-open, daily-open or explicit)"
            ))),
        }
    }
}

/// Resolves the anchor price for a new run
#[async_trait]
pub trait SessionOpenResolver: Send + Sync {
    async fn resolve_starting_price(&self, mode: StartingPriceMode) -> Result<f64, DataError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_modes() {
        assert_eq!(
            StartingPriceMode::parse("weekly-open", None).unwrap(),
            StartingPriceMode::WeeklyOpen
        );
        assert_eq!(
            StartingPriceMode::parse("daily-open", None).unwrap(),
            StartingPriceMode::DailyOpen
        );
        assert_eq!(
            StartingPriceMode::parse("explicit", Some(123.45)).unwrap(),
            StartingPriceMode::Explicit(123.45)
        );
    }

    #[test]
    fn test_explicit_requires_positive_price() {
        assert!(StartingPriceMode::parse("explicit", None).is_err());
        assert!(StartingPriceMode::parse("explicit", Some(0.0)).is_err());
        assert!(StartingPriceMode::parse("explicit", Some(-1.0)).is_err());
    }

    #[test]
    fn test_unknown_mode_rejected() {
        assert!(StartingPriceMode::parse("monthly-open", None).is_err());
    }
}
