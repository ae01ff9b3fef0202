#![allow(dead_code)]
//! fanchart - Live Monte Carlo GBM price-path forecaster

mod adapters;
mod application;
mod config;
mod domain;
mod ports;
mod simulation;

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::{fmt, EnvFilter};

use crate::adapters::cli::{CliApp, Command, ForecastCmd, RunCmd};
use crate::adapters::console::{ConsoleRenderer, OutputFormat};
use crate::adapters::replay::CsvReplaySource;
use crate::adapters::session::CalendarOpenResolver;
use crate::application::{LiveUpdater, UpdaterConfig};
use crate::config::{load_config, Config};
use crate::ports::market_data::HistoricalDataSource;
use crate::ports::session::{SessionOpenResolver, StartingPriceMode};
use crate::simulation::estimator::{ParameterEstimator, Timeframe};
use crate::simulation::generator::PathGenerator;
use crate::simulation::manager::PathManager;
use crate::simulation::zones::ZoneDetector;

#[tokio::main]
async fn main() -> Result<()> {
    let app = CliApp::parse();
    init_logging(app.verbose, app.debug)?;

    match app.command {
        Command::Run(cmd) => run_command(cmd).await,
        Command::Forecast(cmd) => forecast_command(cmd).await,
    }
}

fn init_logging(verbose: bool, debug: bool) -> Result<()> {
    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };

    fmt().with_env_filter(filter).init();
    Ok(())
}

/// Build the replay data source from config, with a helpful error when the
/// file is missing
fn load_replay_source(config: &Config) -> Result<CsvReplaySource> {
    let Some(path) = config.data.replay_path() else {
        bail!(
            "No data source configured.\n\n\
             Set 'replay_file' in the [data] section of your config to a CSV \
             of timestamp,price rows."
        );
    };

    CsvReplaySource::from_file(&path)
        .with_context(|| format!("Failed to load replay file '{path}'"))
}

async fn run_command(cmd: RunCmd) -> Result<()> {
    tracing::info!("Starting fanchart live loop...");

    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let format: OutputFormat = cmd
        .format
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let source = Arc::new(load_replay_source(&config)?);

    // The open resolver anchors on the same history the estimator sees.
    let history = source
        .fetch_history(
            &config.data.symbol,
            std::time::Duration::from_secs(u64::from(config.data.history_lookback_days) * 24 * 3600),
        )
        .await
        .context("Failed to read historical window")?;
    let opens = Arc::new(CalendarOpenResolver::new(history));

    let updater_config =
        UpdaterConfig::try_from(&config).context("Failed to assemble updater configuration")?;

    let updater = LiveUpdater::new(
        updater_config,
        source.clone(),
        source,
        opens,
        Arc::new(ConsoleRenderer::new(format)),
    )
    .context("Failed to create live updater")?;

    // Graceful shutdown at the next tick boundary.
    let handle = updater.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        tracing::info!("Shutdown signal received");
        handle.stop().await;
    });

    updater.run().await.context("Live loop failed")?;
    tracing::info!("fanchart stopped");
    Ok(())
}

async fn forecast_command(cmd: ForecastCmd) -> Result<()> {
    let config = load_config(&cmd.config).context("Failed to load configuration")?;
    let source = load_replay_source(&config)?;

    let lookback =
        std::time::Duration::from_secs(u64::from(config.data.history_lookback_days) * 24 * 3600);
    let history = source
        .fetch_history(&config.data.symbol, lookback)
        .await
        .context("Failed to read historical window")?;

    let timeframe = config.timeframe();
    let params = ParameterEstimator::estimate(&history, timeframe)
        .context("Parameter estimation failed")?;

    println!("Symbol: {}", config.data.symbol);
    println!("Samples: {} ({})", history.len(), timeframe);
    println!("Annualized drift (mu): {:.4}", params.mu);
    println!("Annualized volatility (sigma): {:.4}", params.sigma);

    // Higher-timeframe view of the same window.
    let htf = ParameterEstimator::estimate_multi(&history, timeframe, &Timeframe::HTF);
    if !htf.is_empty() {
        println!("\nHigher timeframes:");
        for (tf, p) in &htf {
            println!("  {:>3}: mu = {:+.4}, sigma = {:.4}", tf.to_string(), p.mu, p.sigma);
        }
    }

    let mode = StartingPriceMode::parse(
        &config.simulation.starting_price_mode,
        config.simulation.starting_price,
    )
    .context("Invalid starting price mode")?;
    let starting_price = CalendarOpenResolver::new(history)
        .resolve_starting_price(mode)
        .await
        .context("Failed to resolve starting price")?;

    let steps = cmd.steps.unwrap_or(config.simulation.forecast_horizon_steps);
    let seed = cmd.seed.unwrap_or(config.simulation.seed);

    let ensemble = PathGenerator::new(
        starting_price,
        params.mu,
        params.sigma,
        config.simulation.num_paths,
        steps,
        timeframe,
        seed,
    )?
    .generate()?;

    let manager = PathManager::new(ensemble);
    let stats = manager
        .survivor_statistics(steps)
        .context("Horizon statistics failed")?;

    println!("\nForecast over {} steps x {} paths (seed {}):", steps, config.simulation.num_paths, seed);
    println!("Starting price: ${:.2}", starting_price);
    println!("Horizon mean: ${:.2}", stats.mean);
    println!("Horizon band: ${:.2} (p10) .. ${:.2} (p50) .. ${:.2} (p90)", stats.p10, stats.p50, stats.p90);

    let zones = ZoneDetector::new(config.zone_detector())
        .detect(&manager.prices_at(steps), starting_price);
    if zones.is_empty() {
        println!("\nNo zones (too few paths to cluster)");
    } else {
        println!("\nZones at horizon:");
        for zone in zones.iter().take(config.live.max_zones) {
            println!(
                "  {:>11}: {:.2}-{:.2}  {} paths ({:.0}%)",
                zone.zone_type.to_string(),
                zone.price_low,
                zone.price_high,
                zone.path_count,
                zone.probability * 100.0,
            );
        }
    }

    Ok(())
}
