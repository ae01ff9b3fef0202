//! Ports Layer - Trait seams to the outside world
//!
//! Following hexagonal architecture, these traits abstract every external
//! collaborator the engine depends on:
//! - Market data (historical series, live ticks)
//! - Session-open resolution (anchor price for a new run)
//! - Snapshot rendering (the externally visible output sink)

pub mod market_data;
pub mod mocks;
pub mod renderer;
pub mod session;

pub use market_data::{DataError, HistoricalDataSource, LiveDataSource};
pub use renderer::SnapshotRenderer;
pub use session::{SessionOpenResolver, StartingPriceMode};
