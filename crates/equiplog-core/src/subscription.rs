use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::snapshot::Snapshot;
use crate::store::SnapshotStore;

/// Either the full current list of recent snapshots or the reason it could
/// not be fetched. Each successful delivery replaces the previous one.
pub type Delivery = Result<Vec<Snapshot>, StoreError>;

const DELIVERY_BUFFER: usize = 16;

/// Live view of the newest snapshots.
///
/// Delivers the initial list, then a fresh list after every change the store
/// announces. Dropping the handle (or calling [`cancel`](Self::cancel)) stops
/// the background task; nothing is delivered afterwards.
pub struct RecentSnapshots {
    receiver: mpsc::Receiver<Delivery>,
    task: JoinHandle<()>,
}

pub fn subscribe_recent(store: Arc<dyn SnapshotStore>, limit: usize) -> RecentSnapshots {
    let (sender, receiver) = mpsc::channel(DELIVERY_BUFFER);

    let task = tokio::spawn(async move {
        // Listen before the first query so a write in between is not missed.
        let feed = store.changes().await;

        if sender.send(store.recent(limit).await).await.is_err() {
            return;
        }

        let mut feed = match feed {
            Ok(feed) => feed,
            Err(err) => {
                warn!(error = %err, "snapshot change feed unavailable");
                let _ = sender.send(Err(err)).await;
                return;
            }
        };

        while let Some(change) = feed.next().await {
            let delivery = match change {
                Ok(()) => store.recent(limit).await,
                Err(err) => Err(err),
            };
            if sender.send(delivery).await.is_err() {
                return;
            }
        }

        debug!("snapshot change feed closed");
    });

    RecentSnapshots { receiver, task }
}

impl RecentSnapshots {
    /// Wait for the next delivery. `None` once the feed has ended.
    pub async fn next(&mut self) -> Option<Delivery> {
        self.receiver.recv().await
    }

    pub fn cancel(self) {
        drop(self);
    }
}

impl Drop for RecentSnapshots {
    fn drop(&mut self) {
        self.task.abort();
        self.receiver.close();
    }
}

