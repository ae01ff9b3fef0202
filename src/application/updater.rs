//! Live Updater
//!
//! The control loop that coordinates estimation, path radiation, elimination
//! and zone detection into one tick cadence.
//!
//! State machine: `Initializing -> Running -> (Stalled | Running) ->
//! Terminated`. Initialization failures (bad parameters, short history) are
//! fatal; everything that happens while running is caught at tick
//! granularity and surfaces through the snapshot's status field instead of
//! killing the loop. Each tick runs to completion before the next one
//! starts - the run context has exactly one writer.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::timeout;

use crate::config::Config;
use crate::domain::errors::SimulationError;
use crate::domain::series::Observation;
use crate::domain::snapshot::{ConfidenceBand, LiveSnapshot, TickStatus};
use crate::domain::zone::ReversalZone;
use crate::ports::market_data::{DataError, HistoricalDataSource, LiveDataSource};
use crate::ports::renderer::SnapshotRenderer;
use crate::ports::session::{SessionOpenResolver, StartingPriceMode};
use crate::simulation::estimator::{ModelParameters, ParameterEstimator, Timeframe};
use crate::simulation::filter::PathFilter;
use crate::simulation::generator::PathGenerator;
use crate::simulation::manager::PathManager;
use crate::simulation::zones::{ZoneDetector, ZoneDetectorConfig};

#[derive(Debug, Error)]
pub enum UpdaterError {
    #[error("initialization failed: {0}")]
    Init(#[from] SimulationError),

    #[error("historical data fetch failed: {0}")]
    History(#[from] DataError),
}

/// Lifecycle of one live run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    Initializing,
    Running,
    /// Every path eliminated; the next tick reseeds
    Stalled,
    Terminated,
}

/// Everything the updater needs, pre-validated by the config loader
#[derive(Debug, Clone)]
pub struct UpdaterConfig {
    pub symbol: String,
    pub num_paths: u32,
    pub horizon_steps: u32,
    pub seed: u64,
    pub timeframe: Timeframe,
    pub starting_price_mode: StartingPriceMode,
    pub tolerance: f64,
    pub update_interval: Duration,
    pub fetch_timeout: Duration,
    pub render_timeout: Duration,
    pub history_lookback: Duration,
    pub zones: ZoneDetectorConfig,
    pub max_zones: usize,
}

impl TryFrom<&Config> for UpdaterConfig {
    type Error = SimulationError;

    fn try_from(config: &Config) -> Result<Self, Self::Error> {
        let timeframe: Timeframe = config.simulation.timeframe.parse()?;
        let starting_price_mode = StartingPriceMode::parse(
            &config.simulation.starting_price_mode,
            config.simulation.starting_price,
        )?;

        Ok(Self {
            symbol: config.data.symbol.clone(),
            num_paths: config.simulation.num_paths,
            horizon_steps: config.simulation.forecast_horizon_steps,
            seed: config.simulation.seed,
            timeframe,
            starting_price_mode,
            tolerance: config.live.tolerance,
            update_interval: Duration::from_secs(config.live.update_interval_secs),
            fetch_timeout: Duration::from_secs(config.live.fetch_timeout_secs),
            render_timeout: Duration::from_secs(config.live.render_timeout_secs),
            history_lookback: Duration::from_secs(
                u64::from(config.data.history_lookback_days) * 24 * 3600,
            ),
            zones: config.zone_detector(),
            max_zones: config.live.max_zones,
        })
    }
}

/// Single-instance run state: ensemble, parameters and tick bookkeeping,
/// reset atomically on reseed
struct RunContext {
    params: ModelParameters,
    manager: PathManager,
    started_at: DateTime<Utc>,
    last_observation: Option<Observation>,
    last_snapshot: Option<LiveSnapshot>,
    reseed_count: u32,
}

/// Status digest for operators
#[derive(Debug, Clone)]
pub struct UpdaterStatus {
    pub state: UpdaterState,
    pub surviving: usize,
    pub total: usize,
    pub reseed_count: u32,
    pub last_price: Option<f64>,
}

/// Coordinates the live path-radiation loop
#[derive(Clone)]
pub struct LiveUpdater {
    config: UpdaterConfig,
    history: Arc<dyn HistoricalDataSource>,
    live: Arc<dyn LiveDataSource>,
    opens: Arc<dyn SessionOpenResolver>,
    renderer: Arc<dyn SnapshotRenderer>,
    filter: PathFilter,
    detector: ZoneDetector,
    state: Arc<RwLock<UpdaterState>>,
    run: Arc<RwLock<Option<RunContext>>>,
    is_running: Arc<RwLock<bool>>,
}

impl LiveUpdater {
    pub fn new(
        config: UpdaterConfig,
        history: Arc<dyn HistoricalDataSource>,
        live: Arc<dyn LiveDataSource>,
        opens: Arc<dyn SessionOpenResolver>,
        renderer: Arc<dyn SnapshotRenderer>,
    ) -> Result<Self, UpdaterError> {
        let filter = PathFilter::new(config.tolerance)?;
        let detector = ZoneDetector::new(config.zones);

        Ok(Self {
            config,
            history,
            live,
            opens,
            renderer,
            filter,
            detector,
            state: Arc::new(RwLock::new(UpdaterState::Initializing)),
            run: Arc::new(RwLock::new(None)),
            is_running: Arc::new(RwLock::new(false)),
        })
    }

    /// Estimate parameters and radiate the initial ensemble.
    ///
    /// Fatal on short history, bad parameters or an unreachable historical
    /// source - nothing is allowed to exist half-built.
    pub async fn initialize(&self) -> Result<(), UpdaterError> {
        let result = self.initialize_inner().await;
        if result.is_err() {
            *self.state.write().await = UpdaterState::Terminated;
        }
        result
    }

    async fn initialize_inner(&self) -> Result<(), UpdaterError> {
        let series = self
            .history
            .fetch_history(&self.config.symbol, self.config.history_lookback)
            .await?;

        let params = ParameterEstimator::estimate(&series, self.config.timeframe)?;
        tracing::info!(
            symbol = %self.config.symbol,
            mu = params.mu,
            sigma = params.sigma,
            timeframe = %params.timeframe,
            "estimated model parameters"
        );

        let starting_price = self
            .opens
            .resolve_starting_price(self.config.starting_price_mode)
            .await?;

        let ensemble = PathGenerator::new(
            starting_price,
            params.mu,
            params.sigma,
            self.config.num_paths,
            self.config.horizon_steps,
            self.config.timeframe,
            self.config.seed,
        )?
        .generate()?;

        tracing::info!(
            paths = ensemble.len(),
            steps = ensemble.num_steps(),
            starting_price,
            seed = self.config.seed,
            "ensemble radiated"
        );

        *self.run.write().await = Some(RunContext {
            params,
            manager: PathManager::new(ensemble),
            started_at: Utc::now(),
            last_observation: None,
            last_snapshot: None,
            reseed_count: 0,
        });
        *self.state.write().await = UpdaterState::Running;
        Ok(())
    }

    /// Run the live loop until stopped
    pub async fn run(&self) -> Result<(), UpdaterError> {
        *self.is_running.write().await = true;

        self.initialize().await?;

        tracing::info!(
            interval = ?self.config.update_interval,
            tolerance = self.filter.tolerance(),
            "live updater started"
        );

        while *self.is_running.read().await {
            if let Err(e) = self.tick().await {
                // Tick-granularity containment: report and keep going.
                tracing::error!("tick error: {e}");
            }
            tokio::time::sleep(self.config.update_interval).await;
        }

        *self.state.write().await = UpdaterState::Terminated;
        *self.run.write().await = None;
        tracing::info!("live updater terminated");
        Ok(())
    }

    /// One discrete unit of work: fetch, filter, detect, snapshot, render.
    /// Never overlaps with itself; callers drive it sequentially.
    pub async fn tick(&self) -> Result<(), UpdaterError> {
        let state = *self.state.read().await;
        match state {
            UpdaterState::Running => self.running_tick().await,
            UpdaterState::Stalled => self.reseed_tick().await,
            UpdaterState::Initializing | UpdaterState::Terminated => Ok(()),
        }
    }

    async fn running_tick(&self) -> Result<(), UpdaterError> {
        let fetched = timeout(
            self.config.fetch_timeout,
            self.live.fetch_latest(&self.config.symbol),
        )
        .await;

        let observation = match fetched {
            Ok(Ok(obs)) => Some(obs),
            Ok(Err(e)) => {
                tracing::warn!("missed tick: {e}");
                None
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.config.fetch_timeout,
                    "missed tick: observation fetch timed out"
                );
                None
            }
        };

        let mut guard = self.run.write().await;
        let Some(ctx) = guard.as_mut() else {
            return Ok(());
        };

        let Some(observation) = observation else {
            let snapshot = stale_snapshot(ctx);
            drop(guard);
            self.render(snapshot).await;
            return Ok(());
        };

        let elapsed = observation
            .timestamp
            .signed_duration_since(ctx.started_at)
            .to_std()
            .unwrap_or(Duration::ZERO);
        let offset = PathFilter::offset_for(elapsed, self.config.timeframe);

        let eliminated = match self.filter.apply(&mut ctx.manager, &observation, offset) {
            Ok(count) => count,
            Err(e) => {
                // A bad observation is a missed tick, not a dead loop.
                tracing::warn!("missed tick: {e}");
                let snapshot = stale_snapshot(ctx);
                drop(guard);
                self.render(snapshot).await;
                return Ok(());
            }
        };
        ctx.last_observation = Some(observation);

        let horizon = ctx.manager.num_steps();
        match ctx.manager.survivor_statistics(horizon) {
            Ok(stats) => {
                tracing::info!(
                    price = observation.price,
                    offset,
                    eliminated,
                    surviving = ctx.manager.survivor_count(),
                    total = ctx.manager.total_paths(),
                    horizon_mean = stats.mean,
                    "tick"
                );

                let zones = self.detect_zones(&ctx.manager, observation.price);
                let snapshot = build_snapshot(ctx, TickStatus::Updated, Some(observation), zones);
                drop(guard);
                self.render(snapshot).await;
            }
            Err(SimulationError::NoSurvivors) => {
                tracing::warn!(
                    price = observation.price,
                    offset,
                    "all paths eliminated, stalling for reseed"
                );
                let snapshot = build_snapshot(ctx, TickStatus::Stalled, Some(observation), vec![]);
                drop(guard);
                *self.state.write().await = UpdaterState::Stalled;
                self.render(snapshot).await;
            }
            Err(e) => {
                tracing::error!("survivor statistics failed: {e}");
            }
        }

        Ok(())
    }

    /// Stalled recovery: rebuild the ensemble around the latest observation.
    /// The old run context is replaced wholesale - parameters survive, every
    /// elimination flag dies.
    async fn reseed_tick(&self) -> Result<(), UpdaterError> {
        let mut guard = self.run.write().await;
        let Some(ctx) = guard.as_mut() else {
            return Ok(());
        };

        // Prefer the observation that stalled us; fall back to a fresh fetch.
        let anchor = match ctx.last_observation {
            Some(obs) => obs,
            None => {
                match timeout(
                    self.config.fetch_timeout,
                    self.live.fetch_latest(&self.config.symbol),
                )
                .await
                {
                    Ok(Ok(obs)) => obs,
                    _ => {
                        tracing::warn!("reseed deferred: no anchor observation available");
                        return Ok(());
                    }
                }
            }
        };

        let reseed_count = ctx.reseed_count + 1;
        // Distinct deterministic stream per reseed.
        let seed = self.config.seed.wrapping_add(u64::from(reseed_count));

        let ensemble = match PathGenerator::new(
            anchor.price,
            ctx.params.mu,
            ctx.params.sigma,
            self.config.num_paths,
            self.config.horizon_steps,
            self.config.timeframe,
            seed,
        )
        .and_then(|g| g.generate())
        {
            Ok(ensemble) => ensemble,
            Err(e) => {
                tracing::error!("reseed failed, staying stalled: {e}");
                return Ok(());
            }
        };

        ctx.manager.reset(ensemble);
        ctx.started_at = anchor.timestamp;
        ctx.last_observation = Some(anchor);
        ctx.reseed_count = reseed_count;

        tracing::info!(
            anchor_price = anchor.price,
            reseed_count,
            seed,
            "ensemble reseeded from latest observation"
        );

        let zones = self.detect_zones(&ctx.manager, anchor.price);
        let snapshot = build_snapshot(ctx, TickStatus::Reseeded, Some(anchor), zones);
        drop(guard);
        *self.state.write().await = UpdaterState::Running;
        self.render(snapshot).await;
        Ok(())
    }

    fn detect_zones(&self, manager: &PathManager, observation_price: f64) -> Vec<ReversalZone> {
        let horizon_prices = manager.prices_at(manager.num_steps());
        let mut zones = self.detector.detect(&horizon_prices, observation_price);
        zones.truncate(self.config.max_zones);
        zones
    }

    async fn render(&self, snapshot: LiveSnapshot) {
        if timeout(self.config.render_timeout, self.renderer.render(&snapshot))
            .await
            .is_err()
        {
            tracing::warn!(
                timeout = ?self.config.render_timeout,
                "renderer exceeded bounded wait"
            );
        }
        if let Some(ctx) = self.run.write().await.as_mut() {
            ctx.last_snapshot = Some(snapshot);
        }
    }

    /// Cooperative stop, honored at the next tick boundary
    pub async fn stop(&self) {
        *self.is_running.write().await = false;
        tracing::info!("stop signal sent to live updater");
    }

    pub async fn state(&self) -> UpdaterState {
        *self.state.read().await
    }

    pub async fn status(&self) -> UpdaterStatus {
        let state = *self.state.read().await;
        let guard = self.run.read().await;
        match guard.as_ref() {
            Some(ctx) => UpdaterStatus {
                state,
                surviving: ctx.manager.survivor_count(),
                total: ctx.manager.total_paths(),
                reseed_count: ctx.reseed_count,
                last_price: ctx.last_observation.map(|o| o.price),
            },
            None => UpdaterStatus {
                state,
                surviving: 0,
                total: 0,
                reseed_count: 0,
                last_price: None,
            },
        }
    }
}

/// Assemble the per-tick read model from the current run context
fn build_snapshot(
    ctx: &RunContext,
    status: TickStatus,
    observation: Option<Observation>,
    zones: Vec<ReversalZone>,
) -> LiveSnapshot {
    let manager = &ctx.manager;
    let (lower, upper) = manager.percentile_band(10, 90);
    LiveSnapshot {
        as_of: Utc::now(),
        status,
        observation,
        surviving_paths: manager.survivors().cloned().collect(),
        surviving_count: manager.survivor_count(),
        eliminated_count: manager.eliminated_count(),
        total_paths: manager.total_paths(),
        mean_path: manager.mean_path(),
        confidence_band: ConfidenceBand { lower, upper },
        zones,
        reseed_count: ctx.reseed_count,
    }
}

/// Re-issue the previous snapshot marked stale; before any successful tick,
/// fall back to an unfiltered view of the current ensemble
fn stale_snapshot(ctx: &RunContext) -> LiveSnapshot {
    match &ctx.last_snapshot {
        Some(previous) => {
            let mut snapshot = previous.clone();
            snapshot.as_of = Utc::now();
            snapshot.status = TickStatus::Stale;
            snapshot
        }
        None => build_snapshot(ctx, TickStatus::Stale, ctx.last_observation, vec![]),
    }
}
