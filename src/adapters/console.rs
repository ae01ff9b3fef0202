//! Console snapshot renderer
//!
//! The default rendering sink: one line per tick in text mode, one JSON
//! object per tick in json mode (for piping into a charting frontend).

use async_trait::async_trait;
use std::fmt::Write as _;
use std::str::FromStr;

use crate::domain::snapshot::{LiveSnapshot, TickStatus};
use crate::ports::renderer::SnapshotRenderer;

/// Output style for the console renderer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(OutputFormat::Text),
            "json" => Ok(OutputFormat::Json),
            other => Err(format!("unknown output format '{other}' (expected text or json)")),
        }
    }
}

/// Prints per-tick snapshots to stdout
#[derive(Debug, Clone, Copy)]
pub struct ConsoleRenderer {
    format: OutputFormat,
}

impl ConsoleRenderer {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn text_line(snapshot: &LiveSnapshot) -> String {
        let mut line = String::new();

        let marker = match snapshot.status {
            TickStatus::Updated => "",
            TickStatus::Stale => " [STALE]",
            TickStatus::Stalled => " [STALLED]",
            TickStatus::Reseeded => " [RESEEDED]",
        };

        let price = snapshot
            .observation
            .map(|o| format!("${:.2}", o.price))
            .unwrap_or_else(|| "-".to_string());

        let _ = write!(
            line,
            "{}{} | {} | paths {}/{} ({:.1}%)",
            snapshot.as_of.format("%H:%M:%S"),
            marker,
            price,
            snapshot.surviving_count,
            snapshot.total_paths,
            snapshot.survival_rate() * 100.0,
        );

        for zone in &snapshot.zones {
            let _ = write!(
                line,
                " | {} {:.2}-{:.2} ({:.0}%)",
                zone.zone_type,
                zone.price_low,
                zone.price_high,
                zone.probability * 100.0,
            );
        }

        line
    }
}

#[async_trait]
impl SnapshotRenderer for ConsoleRenderer {
    async fn render(&self, snapshot: &LiveSnapshot) {
        match self.format {
            OutputFormat::Text => println!("{}", Self::text_line(snapshot)),
            OutputFormat::Json => match serde_json::to_string(&snapshot.summary()) {
                Ok(json) => println!("{json}"),
                Err(e) => tracing::error!("failed to serialize snapshot: {e}"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::snapshot::ConfidenceBand;
    use crate::domain::zone::{ReversalZone, ZoneType};
    use chrono::Utc;

    fn snapshot(status: TickStatus) -> LiveSnapshot {
        LiveSnapshot {
            as_of: Utc::now(),
            status,
            observation: None,
            surviving_paths: vec![],
            surviving_count: 420,
            eliminated_count: 80,
            total_paths: 500,
            mean_path: vec![],
            confidence_band: ConfidenceBand { lower: vec![], upper: vec![] },
            zones: vec![ReversalZone {
                price_low: 21450.0,
                price_high: 21460.0,
                zone_type: ZoneType::Support,
                path_count: 160,
                probability: 0.32,
            }],
            reseed_count: 0,
        }
    }

    #[test]
    fn test_text_line_contents() {
        let line = ConsoleRenderer::text_line(&snapshot(TickStatus::Updated));
        assert!(line.contains("paths 420/500 (84.0%)"));
        assert!(line.contains("support 21450.00-21460.00 (32%)"));
        assert!(!line.contains("[STALE]"));
    }

    #[test]
    fn test_text_line_marks_degraded_ticks() {
        assert!(ConsoleRenderer::text_line(&snapshot(TickStatus::Stale)).contains("[STALE]"));
        assert!(
            ConsoleRenderer::text_line(&snapshot(TickStatus::Reseeded)).contains("[RESEEDED]")
        );
    }

    #[test]
    fn test_format_parsing() {
        assert_eq!("text".parse::<OutputFormat>().unwrap(), OutputFormat::Text);
        assert_eq!("json".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }
}
