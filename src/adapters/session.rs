//! Calendar-based session open resolution
//!
//! Anchors a run on the open of the current trading week or day, derived
//! from the historical series itself rather than wall-clock state: the
//! reference session is the one containing the last sample, so replayed and
//! live runs resolve identically. Weeks are ISO weeks, days are UTC dates.

use async_trait::async_trait;
use chrono::Datelike;

use crate::domain::series::PriceSeries;
use crate::ports::market_data::DataError;
use crate::ports::session::{SessionOpenResolver, StartingPriceMode};

/// Resolves weekly/daily opens from a historical price series
#[derive(Debug, Clone)]
pub struct CalendarOpenResolver {
    history: PriceSeries,
}

impl CalendarOpenResolver {
    pub fn new(history: PriceSeries) -> Self {
        Self { history }
    }
}

#[async_trait]
impl SessionOpenResolver for CalendarOpenResolver {
    async fn resolve_starting_price(&self, mode: StartingPriceMode) -> Result<f64, DataError> {
        let reference = self
            .history
            .last()
            .ok_or_else(|| DataError::Unavailable("empty history".to_string()))?;

        let open = match mode {
            StartingPriceMode::Explicit(price) => return Ok(price),
            StartingPriceMode::WeeklyOpen => {
                let week = reference.timestamp.iso_week();
                self.history
                    .points()
                    .iter()
                    .find(|p| p.timestamp.iso_week() == week)
            }
            StartingPriceMode::DailyOpen => {
                let day = reference.timestamp.date_naive();
                self.history
                    .points()
                    .iter()
                    .find(|p| p.timestamp.date_naive() == day)
            }
        };

        open.map(|p| p.price)
            .ok_or_else(|| DataError::Unavailable("no sample in current session".to_string()))
    }
}
