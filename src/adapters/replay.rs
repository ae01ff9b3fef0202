//! CSV replay data source
//!
//! Plays a recorded price file through the market-data ports: the leading
//! share of rows serves as the historical window, the trailing rows replay
//! one-by-one as live ticks. Lets the whole engine run offline and makes
//! live-session tests reproducible.
//!
//! File format: `timestamp,price` with RFC 3339 timestamps.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;

use crate::domain::series::{Observation, PricePoint, PriceSeries};
use crate::ports::market_data::{DataError, HistoricalDataSource, LiveDataSource};

/// Share of rows used as history when none is specified
const DEFAULT_HISTORY_FRACTION: f64 = 0.8;

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read replay file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse replay file: {0}")]
    Csv(#[from] csv::Error),

    #[error("replay file has no usable rows")]
    Empty,

    #[error("replay rows out of order: {0}")]
    OutOfOrder(String),
}

#[derive(Debug, Deserialize)]
struct ReplayRow {
    timestamp: DateTime<Utc>,
    price: f64,
}

/// Replays a recorded CSV through the historical and live data ports
#[derive(Debug, Clone)]
pub struct CsvReplaySource {
    points: Arc<Vec<PricePoint>>,
    /// Rows at `live_start..` play back as live ticks
    live_start: usize,
    cursor: Arc<Mutex<usize>>,
}

impl CsvReplaySource {
    /// Load a replay file, splitting the default history share off the front
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ReplayError> {
        Self::from_file_with_split(path, DEFAULT_HISTORY_FRACTION)
    }

    /// Load a replay file; the first `history_fraction` of rows become the
    /// historical window, the rest the live feed
    pub fn from_file_with_split<P: AsRef<Path>>(
        path: P,
        history_fraction: f64,
    ) -> Result<Self, ReplayError> {
        let mut reader = csv::Reader::from_path(path.as_ref())?;
        let mut points = Vec::new();
        for row in reader.deserialize() {
            let row: ReplayRow = row?;
            points.push(PricePoint {
                timestamp: row.timestamp,
                price: row.price,
            });
        }
        Self::new(points, history_fraction)
    }

    pub fn new(points: Vec<PricePoint>, history_fraction: f64) -> Result<Self, ReplayError> {
        if points.is_empty() {
            return Err(ReplayError::Empty);
        }
        for pair in points.windows(2) {
            if pair[1].timestamp <= pair[0].timestamp {
                return Err(ReplayError::OutOfOrder(format!(
                    "{} then {}",
                    pair[0].timestamp, pair[1].timestamp
                )));
            }
        }

        let fraction = history_fraction.clamp(0.0, 1.0);
        let live_start = ((points.len() as f64 * fraction) as usize).clamp(1, points.len());

        Ok(Self {
            points: Arc::new(points),
            live_start,
            cursor: Arc::new(Mutex::new(live_start)),
        })
    }

    /// Rows remaining in the live feed
    pub fn remaining_live_rows(&self) -> usize {
        self.points.len() - *self.cursor.lock().unwrap()
    }
}

#[async_trait]
impl HistoricalDataSource for CsvReplaySource {
    async fn fetch_history(
        &self,
        _symbol: &str,
        lookback: Duration,
    ) -> Result<PriceSeries, DataError> {
        let history = &self.points[..self.live_start];
        let end = history[history.len() - 1].timestamp;
        let start = end
            - chrono::Duration::from_std(lookback)
                .map_err(|e| DataError::Unavailable(format!("lookback out of range: {e}")))?;

        let window: Vec<PricePoint> = history
            .iter()
            .filter(|p| p.timestamp >= start)
            .copied()
            .collect();

        PriceSeries::new(window).map_err(|e| DataError::Unavailable(e.to_string()))
    }
}

#[async_trait]
impl LiveDataSource for CsvReplaySource {
    async fn fetch_latest(&self, _symbol: &str) -> Result<Observation, DataError> {
        let mut cursor = self.cursor.lock().unwrap();
        match self.points.get(*cursor) {
            Some(point) => {
                *cursor += 1;
                Ok(Observation {
                    timestamp: point.timestamp,
                    price: point.price,
                })
            }
            None => Err(DataError::Unavailable("replay exhausted".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn points(n: usize) -> Vec<PricePoint> {
        (0..n)
            .map(|i| PricePoint {
                timestamp: Utc.timestamp_opt(i as i64 * 60, 0).unwrap(),
                price: 100.0 + i as f64,
            })
            .collect()
    }

    #[tokio::test]
    async fn test_history_live_split() {
        let source = CsvReplaySource::new(points(10), 0.8).unwrap();

        let history = source
            .fetch_history("NQ", Duration::from_secs(3600))
            .await
            .unwrap();
        assert_eq!(history.len(), 8);
        assert_eq!(history.last().unwrap().price, 107.0);

        // Live playback picks up exactly where history ends.
        let first = source.fetch_latest("NQ").await.unwrap();
        assert_eq!(first.price, 108.0);
        let second = source.fetch_latest("NQ").await.unwrap();
        assert_eq!(second.price, 109.0);
        assert!(matches!(
            source.fetch_latest("NQ").await,
            Err(DataError::Unavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_lookback_window_trims_history() {
        let source = CsvReplaySource::new(points(10), 0.8).unwrap();

        // 2 minutes of lookback from the last history row at t=420s.
        let history = source
            .fetch_history("NQ", Duration::from_secs(120))
            .await
            .unwrap();
        assert_eq!(history.len(), 3);
        assert_eq!(history.points()[0].price, 105.0);
    }

    #[test]
    fn test_rejects_empty_and_unordered_input() {
        assert!(matches!(
            CsvReplaySource::new(vec![], 0.8),
            Err(ReplayError::Empty)
        ));

        let mut unordered = points(3);
        unordered.swap(0, 2);
        assert!(matches!(
            CsvReplaySource::new(unordered, 0.8),
            Err(ReplayError::OutOfOrder(_))
        ));
    }

    #[tokio::test]
    async fn test_from_file_parses_csv() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "timestamp,price").unwrap();
        writeln!(file, "2026-08-03T13:30:00Z,21500.0").unwrap();
        writeln!(file, "2026-08-03T13:31:00Z,21502.5").unwrap();
        writeln!(file, "2026-08-03T13:32:00Z,21501.0").unwrap();
        writeln!(file, "2026-08-03T13:33:00Z,21503.75").unwrap();
        file.flush().unwrap();

        let source = CsvReplaySource::from_file_with_split(file.path(), 0.5).unwrap();
        let history = source
            .fetch_history("NQ", Duration::from_secs(86400))
            .await
            .unwrap();
        assert_eq!(history.len(), 2);

        let live = source.fetch_latest("NQ").await.unwrap();
        assert_eq!(live.price, 21501.0);
        assert_eq!(source.remaining_live_rows(), 1);
    }

    #[test]
    fn test_shared_cursor_across_clones() {
        let source = CsvReplaySource::new(points(10), 0.5).unwrap();
        let clone = source.clone();
        assert_eq!(source.remaining_live_rows(), clone.remaining_live_rows());
    }
}
