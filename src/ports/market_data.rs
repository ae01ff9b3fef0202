//! Market data ports
//!
//! The engine never talks to a data vendor directly; it consumes these two
//! narrow traits. Both error variants are treated identically during a live
//! run: the tick is missed, reported as stale, and retried next cycle.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::domain::series::{Observation, PriceSeries};

/// Market data acquisition errors
#[derive(Debug, Clone, Error)]
pub enum DataError {
    /// Vendor unreachable or returned nothing usable
    #[error("data unavailable: {0}")]
    Unavailable(String),

    /// Vendor throttled the request
    #[error("rate limited by data source")]
    RateLimited,
}

/// Historical price fetch, used once per (re-)initialization
#[async_trait]
pub trait HistoricalDataSource: Send + Sync {
    async fn fetch_history(
        &self,
        symbol: &str,
        lookback: Duration,
    ) -> Result<PriceSeries, DataError>;
}

/// Latest-tick fetch, polled once per live cycle
#[async_trait]
pub trait LiveDataSource: Send + Sync {
    async fn fetch_latest(&self, symbol: &str) -> Result<Observation, DataError>;
}
