//! Persistence of upload snapshots.
//!
//! Stores are append-only: there is no update or delete path. Every
//! successful `save` is announced on the change feed so live subscribers
//! re-query the newest snapshots.

mod memory;
mod postgres;

use async_trait::async_trait;
use equiplog_parser::EquipmentRecord;
use futures::stream::BoxStream;

use crate::error::StoreError;
use crate::snapshot::Snapshot;

pub use memory::InMemorySnapshotStore;
pub use postgres::PostgresSnapshotStore;

/// Fires once per committed write. Lagging consumers may see fewer events
/// than writes; each event only means "re-query".
pub type ChangeFeed = BoxStream<'static, Result<(), StoreError>>;

#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Persist a new snapshot; the store assigns id and creation time.
    async fn save(&self, filename: &str, records: &[EquipmentRecord])
        -> Result<Snapshot, StoreError>;

    /// Newest first, at most `limit`. Snapshots without a timestamp sort first.
    async fn recent(&self, limit: usize) -> Result<Vec<Snapshot>, StoreError>;

    async fn changes(&self) -> Result<ChangeFeed, StoreError>;
}
