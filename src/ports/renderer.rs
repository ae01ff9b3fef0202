//! Snapshot rendering port
//!
//! A side-effecting sink for per-tick snapshots. The updater never inspects
//! a result and never lets a slow renderer hold up the next tick beyond a
//! bounded wait.

use async_trait::async_trait;

use crate::domain::snapshot::LiveSnapshot;

/// Receives one immutable snapshot per live cycle
#[async_trait]
pub trait SnapshotRenderer: Send + Sync {
    async fn render(&self, snapshot: &LiveSnapshot);
}
