use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use equiplog_parser::EquipmentRecord;
use futures::{stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use uuid::Uuid;

use super::{ChangeFeed, SnapshotStore};
use crate::error::StoreError;
use crate::snapshot::{Snapshot, SnapshotSummary};

const CHANGE_BUFFER: usize = 64;

#[derive(Default)]
struct MemoryState {
    /// Insertion order.
    snapshots: Vec<Snapshot>,
    write_failure: Option<String>,
    read_failure: Option<String>,
    defer_timestamps: bool,
}

/// Process-local store used by `--memory` runs and tests.
///
/// Failures can be injected for writes and reads, and timestamp assignment
/// can be deferred to exercise snapshots whose time has not materialised.
#[derive(Clone)]
pub struct InMemorySnapshotStore {
    state: Arc<Mutex<MemoryState>>,
    changes: broadcast::Sender<()>,
}

impl Default for InMemorySnapshotStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_BUFFER);
        Self {
            state: Arc::new(Mutex::new(MemoryState::default())),
            changes,
        }
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Make subsequent saves fail with `reason`; `None` clears it.
    pub fn fail_writes(&self, reason: Option<&str>) {
        self.state().write_failure = reason.map(str::to_string);
    }

    /// Make subsequent queries fail with `reason`; `None` clears it.
    pub fn fail_reads(&self, reason: Option<&str>) {
        self.state().read_failure = reason.map(str::to_string);
    }

    /// Leave `created_at` unset on new snapshots until
    /// [`materialize_timestamps`](Self::materialize_timestamps) runs.
    pub fn defer_timestamps(&self, defer: bool) {
        self.state().defer_timestamps = defer;
    }

    /// Stamp every pending snapshot with the current time and announce it.
    pub fn materialize_timestamps(&self) {
        let now = Utc::now();
        let mut stamped = false;
        for snapshot in self.state().snapshots.iter_mut() {
            if snapshot.created_at.is_none() {
                snapshot.created_at = Some(now);
                stamped = true;
            }
        }
        if stamped {
            let _ = self.changes.send(());
        }
    }

    /// Live change-feed receivers.
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    pub fn len(&self) -> usize {
        self.state().snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn save(
        &self,
        filename: &str,
        records: &[EquipmentRecord],
    ) -> Result<Snapshot, StoreError> {
        let snapshot = {
            let mut state = self.state();
            if let Some(reason) = &state.write_failure {
                return Err(StoreError::Unavailable(reason.clone()));
            }

            let snapshot = Snapshot {
                id: Uuid::new_v4(),
                filename: filename.to_string(),
                created_at: (!state.defer_timestamps).then(Utc::now),
                records: records.to_vec(),
                summary: SnapshotSummary::from_records(records),
            };
            state.snapshots.push(snapshot.clone());
            snapshot
        };

        // No receivers is fine: nobody is watching.
        let _ = self.changes.send(());
        Ok(snapshot)
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Snapshot>, StoreError> {
        let state = self.state();
        if let Some(reason) = &state.read_failure {
            return Err(StoreError::Unavailable(reason.clone()));
        }

        let mut newest: Vec<Snapshot> = state.snapshots.iter().rev().cloned().collect();
        // Stable sort keeps later inserts ahead on equal timestamps.
        newest.sort_by(|a, b| match (a.created_at, b.created_at) {
            (None, None) => std::cmp::Ordering::Equal,
            (None, Some(_)) => std::cmp::Ordering::Less,
            (Some(_), None) => std::cmp::Ordering::Greater,
            (Some(a), Some(b)) => b.cmp(&a),
        });
        newest.truncate(limit);
        Ok(newest)
    }

    async fn changes(&self) -> Result<ChangeFeed, StoreError> {
        let receiver = self.changes.subscribe();
        let feed = stream::unfold(receiver, |mut receiver| async move {
            match receiver.recv().await {
                Ok(()) | Err(RecvError::Lagged(_)) => {
                    Some((Ok::<(), StoreError>(()), receiver))
                }
                Err(RecvError::Closed) => None,
            }
        });
        Ok(feed.boxed())
    }
}
