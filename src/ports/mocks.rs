//! Test doubles for the port traits
//!
//! Recording mocks with controlled responses, shared by unit tests and the
//! integration suite. Not compiled out of the library so integration tests
//! can drive a full live session without a data vendor.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::domain::series::{Observation, PriceSeries};
use crate::domain::snapshot::LiveSnapshot;
use crate::ports::market_data::{DataError, HistoricalDataSource, LiveDataSource};
use crate::ports::renderer::SnapshotRenderer;
use crate::ports::session::{SessionOpenResolver, StartingPriceMode};

/// Historical source returning one fixed series
#[derive(Debug, Clone)]
pub struct FixedHistory {
    series: PriceSeries,
    calls: Arc<Mutex<Vec<String>>>,
}

impl FixedHistory {
    pub fn new(series: PriceSeries) -> Self {
        Self {
            series,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Symbols requested so far
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl HistoricalDataSource for FixedHistory {
    async fn fetch_history(
        &self,
        symbol: &str,
        _lookback: Duration,
    ) -> Result<PriceSeries, DataError> {
        self.calls.lock().unwrap().push(symbol.to_string());
        Ok(self.series.clone())
    }
}

/// Live source that plays back a scripted sequence of tick results
#[derive(Debug, Clone, Default)]
pub struct ScriptedLiveData {
    script: Arc<Mutex<VecDeque<Result<Observation, DataError>>>>,
    call_count: Arc<Mutex<usize>>,
}

impl ScriptedLiveData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_observation(&self, observation: Observation) -> &Self {
        self.script.lock().unwrap().push_back(Ok(observation));
        self
    }

    pub fn push_error(&self, error: DataError) -> &Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn call_count(&self) -> usize {
        *self.call_count.lock().unwrap()
    }
}

#[async_trait]
impl LiveDataSource for ScriptedLiveData {
    async fn fetch_latest(&self, _symbol: &str) -> Result<Observation, DataError> {
        *self.call_count.lock().unwrap() += 1;
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(DataError::Unavailable("script exhausted".to_string())))
    }
}

/// Open resolver returning one fixed anchor price
#[derive(Debug, Clone, Copy)]
pub struct FixedOpenResolver {
    price: f64,
}

impl FixedOpenResolver {
    pub fn new(price: f64) -> Self {
        Self { price }
    }
}

#[async_trait]
impl SessionOpenResolver for FixedOpenResolver {
    async fn resolve_starting_price(&self, mode: StartingPriceMode) -> Result<f64, DataError> {
        match mode {
            StartingPriceMode::Explicit(price) => Ok(price),
            _ => Ok(self.price),
        }
    }
}

/// Renderer that records every snapshot it is handed
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    snapshots: Arc<Mutex<Vec<LiveSnapshot>>>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshots(&self) -> Vec<LiveSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    pub fn last(&self) -> Option<LiveSnapshot> {
        self.snapshots.lock().unwrap().last().cloned()
    }
}

#[async_trait]
impl SnapshotRenderer for RecordingRenderer {
    async fn render(&self, snapshot: &LiveSnapshot) {
        self.snapshots.lock().unwrap().push(snapshot.clone());
    }
}
