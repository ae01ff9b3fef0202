//! fanchart - Live Monte Carlo GBM Path-Radiation Engine
//!
//! Radiates an ensemble of Geometric Brownian Motion price paths from a
//! session open, then continuously narrows the ensemble by eliminating paths
//! the live tape proves wrong, surfacing support/resistance/convergence
//! zones where the survivors cluster.
//!
//! # Modules
//!
//! - `domain`: Core types (PriceSeries, SimulatedPath, Ensemble, snapshots)
//! - `simulation`: Estimator, path generator, manager, filter, zone detector
//! - `ports`: Trait seams (market data, session opens, renderer)
//! - `adapters`: Implementations (CSV replay, calendar opens, console, CLI)
//! - `config`: Configuration loading and validation
//! - `application`: The live updater control loop

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod simulation;
