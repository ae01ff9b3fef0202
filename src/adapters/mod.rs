//! Adapters Layer - External System Implementations
//!
//! Implementations of the port traits:
//! - Replay: CSV-backed historical and live data source
//! - Session: calendar-based open resolution from the data itself
//! - Console: text/JSON snapshot rendering to stdout
//! - CLI: command-line argument definitions

pub mod cli;
pub mod console;
pub mod replay;
pub mod session;

pub use cli::CliApp;
pub use console::{ConsoleRenderer, OutputFormat};
pub use replay::CsvReplaySource;
pub use session::CalendarOpenResolver;
