//! Simulation Layer - Estimation, path radiation and elimination
//!
//! The stochastic core of the engine:
//! - `estimator`: annualized mu/sigma from log returns, multi-timeframe
//! - `generator`: seeded Monte Carlo GBM path ensembles
//! - `manager`: ensemble ownership, survivor statistics, reset
//! - `filter`: per-tick elimination against live observations
//! - `zones`: support/resistance/convergence extraction from survivors

pub mod estimator;
pub mod filter;
pub mod generator;
pub mod manager;
pub mod zones;

pub use estimator::{ModelParameters, ParameterEstimator, Timeframe};
pub use filter::PathFilter;
pub use generator::PathGenerator;
pub use manager::{PathManager, SurvivorStats};
pub use zones::{ZoneDetector, ZoneDetectorConfig};
