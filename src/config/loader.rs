//! Configuration Loader
//!
//! Loads and validates configuration from TOML files. Every recognized
//! option is validated here, before any ensemble is created - invalid
//! values fail fast at startup rather than mid-run.

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;

use crate::simulation::estimator::Timeframe;
use crate::simulation::zones::ZoneDetectorConfig;

/// Main configuration structure matching config.toml
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub simulation: SimulationSection,
    pub live: LiveSection,
    pub data: DataSection,
    #[serde(default)]
    pub logging: LoggingSection,
}

/// Simulation setup: ensemble shape, seeding, starting price
#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSection {
    /// Number of Monte Carlo paths to radiate
    pub num_paths: u32,
    /// Forecast horizon in discrete steps
    pub forecast_horizon_steps: u32,
    /// Seed for the deterministic path streams
    pub seed: u64,
    /// Sampling timeframe: "1d", "4h", "1h", "15m", "5m", "1m"
    pub timeframe: String,
    /// "weekly-open", "daily-open" or "explicit"
    pub starting_price_mode: String,
    /// Anchor price, required when mode is "explicit"
    #[serde(default)]
    pub starting_price: Option<f64>,
}

/// Live loop tuning
#[derive(Debug, Clone, Deserialize)]
pub struct LiveSection {
    /// Maximum relative deviation before a path is eliminated
    pub tolerance: f64,
    /// Seconds between ticks
    pub update_interval_secs: u64,
    /// Bounded wait for an observation fetch before the tick is missed
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    /// Bounded wait for the renderer
    #[serde(default = "default_render_timeout_secs")]
    pub render_timeout_secs: u64,
    /// Survivors needed before zone clustering is attempted
    #[serde(default = "default_min_zone_survivors")]
    pub min_zone_survivors: usize,
    /// Histogram bins for zone clustering
    #[serde(default = "default_zone_bins")]
    pub zone_bins: usize,
    /// Fraction of the peak bin a bin needs to qualify as a zone
    #[serde(default = "default_zone_density_floor")]
    pub zone_density_floor: f64,
    /// Zones surfaced per snapshot
    #[serde(default = "default_max_zones")]
    pub max_zones: usize,
}

fn default_fetch_timeout_secs() -> u64 {
    10
}

fn default_render_timeout_secs() -> u64 {
    5
}

fn default_min_zone_survivors() -> usize {
    5
}

fn default_zone_bins() -> usize {
    50
}

fn default_zone_density_floor() -> f64 {
    0.3
}

fn default_max_zones() -> usize {
    5
}

/// Data source selection
#[derive(Debug, Clone, Deserialize)]
pub struct DataSection {
    /// Instrument symbol (for logging and the data ports)
    pub symbol: String,
    /// Historical window used for parameter estimation
    pub history_lookback_days: u32,
    /// CSV file for the replay data source ('~' is expanded)
    #[serde(default)]
    pub replay_file: Option<String>,
}

impl DataSection {
    /// Replay file path with `~` expanded
    pub fn replay_path(&self) -> Option<String> {
        self.replay_file
            .as_ref()
            .map(|p| shellexpand::tilde(p).to_string())
    }
}

/// Logging configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSection {
    /// Log level: "trace", "debug", "info", "warn", "error"
    pub level: String,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self { level: "info".to_string() }
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    IoError(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    ParseError(#[from] toml::de::Error),
    #[error("Validation failed: {0}")]
    ValidationError(String),
}

/// Load configuration from a TOML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = std::fs::read_to_string(path)?;
    let config: Config = toml::from_str(&content)?;
    config.validate()?;
    Ok(config)
}

impl Config {
    /// Validate all configuration parameters
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.num_paths < 1 {
            return Err(ConfigError::ValidationError(format!(
                "num_paths must be >= 1, got {}",
                self.simulation.num_paths
            )));
        }

        if self.simulation.forecast_horizon_steps < 1 {
            return Err(ConfigError::ValidationError(format!(
                "forecast_horizon_steps must be >= 1, got {}",
                self.simulation.forecast_horizon_steps
            )));
        }

        self.simulation
            .timeframe
            .parse::<Timeframe>()
            .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        crate::ports::session::StartingPriceMode::parse(
            &self.simulation.starting_price_mode,
            self.simulation.starting_price,
        )
        .map_err(|e| ConfigError::ValidationError(e.to_string()))?;

        if !(self.live.tolerance > 0.0 && self.live.tolerance < 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "tolerance must be in (0, 1), got {}",
                self.live.tolerance
            )));
        }

        if self.live.update_interval_secs == 0 {
            return Err(ConfigError::ValidationError(
                "update_interval_secs must be >= 1".to_string(),
            ));
        }

        if self.live.fetch_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "fetch_timeout_secs must be >= 1".to_string(),
            ));
        }

        if !(self.live.zone_density_floor > 0.0 && self.live.zone_density_floor <= 1.0) {
            return Err(ConfigError::ValidationError(format!(
                "zone_density_floor must be in (0, 1], got {}",
                self.live.zone_density_floor
            )));
        }

        if self.live.zone_bins == 0 {
            return Err(ConfigError::ValidationError(
                "zone_bins must be >= 1".to_string(),
            ));
        }

        if self.data.symbol.is_empty() {
            return Err(ConfigError::ValidationError(
                "symbol cannot be empty".to_string(),
            ));
        }

        if self.data.history_lookback_days < 1 {
            return Err(ConfigError::ValidationError(format!(
                "history_lookback_days must be >= 1, got {}",
                self.data.history_lookback_days
            )));
        }

        Ok(())
    }

    /// Validated sampling timeframe
    pub fn timeframe(&self) -> Timeframe {
        // validate() has already parsed this.
        self.simulation
            .timeframe
            .parse()
            .unwrap_or(Timeframe::Min1)
    }

    /// Zone detector knobs from the live section
    pub fn zone_detector(&self) -> ZoneDetectorConfig {
        ZoneDetectorConfig {
            num_bins: self.live.zone_bins,
            density_floor: self.live.zone_density_floor,
            min_survivors: self.live.min_zone_survivors,
        }
    }
}
