use chrono::{DateTime, Utc};
use equiplog_parser::EquipmentRecord;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotSummary {
    pub total: usize,
    pub critical: usize,
}

impl SnapshotSummary {
    pub fn from_records(records: &[EquipmentRecord]) -> Self {
        Self {
            total: records.len(),
            critical: records
                .iter()
                .filter(|record| record.status.is_critical())
                .count(),
        }
    }
}

/// One persisted upload. Snapshots are immutable once written.
///
/// `created_at` is assigned by the store; `None` means the timestamp has not
/// materialised yet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub filename: String,
    pub created_at: Option<DateTime<Utc>>,
    pub records: Vec<EquipmentRecord>,
    pub summary: SnapshotSummary,
}
