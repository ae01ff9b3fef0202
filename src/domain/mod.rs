//! Domain Layer - Core types for the path-radiation engine
//!
//! Pure data types with no external-system dependencies. All I/O happens
//! through the ports layer; all mutation of path status happens through the
//! simulation layer's `PathManager`.

pub mod errors;
pub mod path;
pub mod series;
pub mod snapshot;
pub mod zone;

pub use errors::SimulationError;
pub use path::{Ensemble, SimulatedPath};
pub use series::{Observation, PricePoint, PriceSeries};
pub use snapshot::{ConfidenceBand, LiveSnapshot, SnapshotSummary, TickStatus};
pub use zone::{ReversalZone, ZoneType};
