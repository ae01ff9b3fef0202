//! CLI Command Definitions
//!
//! Argument parsing for the fanchart binary.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// fanchart - Live Monte Carlo GBM price-path forecaster
#[derive(Parser, Debug)]
#[command(
    name = "fanchart",
    version = env!("CARGO_PKG_VERSION"),
    author = env!("CARGO_PKG_AUTHORS"),
    about = "Live Monte Carlo GBM price-path forecaster",
    long_about = "fanchart radiates an ensemble of GBM price paths from a session open, \
                  then continuously eliminates the paths the live tape proves wrong, \
                  surfacing the support/resistance/convergence zones where survivors cluster."
)]
pub struct CliApp {
    /// The command to execute
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the live path-radiation loop
    Run(RunCmd),

    /// One-shot forecast: estimate parameters and radiate an ensemble
    Forecast(ForecastCmd),
}

/// Start the live loop
#[derive(Parser, Debug)]
pub struct RunCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Snapshot output format (text, json)
    #[arg(short, long, value_name = "FORMAT", default_value = "text")]
    pub format: String,
}

/// One-shot forecast
#[derive(Parser, Debug)]
pub struct ForecastCmd {
    /// Path to configuration file
    #[arg(short, long, value_name = "FILE", default_value = "config/default.toml")]
    pub config: PathBuf,

    /// Override the forecast horizon in steps
    #[arg(long, value_name = "STEPS")]
    pub steps: Option<u32>,

    /// Override the random seed
    #[arg(long, value_name = "SEED")]
    pub seed: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_defaults() {
        let app = CliApp::parse_from(["fanchart", "run"]);
        match app.command {
            Command::Run(cmd) => {
                assert_eq!(cmd.config, PathBuf::from("config/default.toml"));
                assert_eq!(cmd.format, "text");
            }
            _ => panic!("expected run command"),
        }
        assert!(!app.verbose);
    }

    #[test]
    fn test_forecast_overrides() {
        let app = CliApp::parse_from([
            "fanchart",
            "forecast",
            "--steps",
            "500",
            "--seed",
            "7",
            "--verbose",
        ]);
        match app.command {
            Command::Forecast(cmd) => {
                assert_eq!(cmd.steps, Some(500));
                assert_eq!(cmd.seed, Some(7));
            }
            _ => panic!("expected forecast command"),
        }
        assert!(app.verbose);
    }
}
