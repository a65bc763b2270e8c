use std::sync::Arc;

use equiplog_core::{subscribe_recent, Dashboard, NoticeBuffer};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::debug;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub dashboard: Mutex<Dashboard>,
    /// Notices raised by the dashboard, drained into responses.
    pub notices: NoticeBuffer,
}

impl AppState {
    pub fn new(dashboard: Dashboard, notices: NoticeBuffer) -> SharedState {
        Arc::new(Self {
            dashboard: Mutex::new(dashboard),
            notices,
        })
    }

    /// Feed live snapshot deliveries into the dashboard's activity log until
    /// the returned task is aborted.
    pub fn spawn_sync(self: &Arc<Self>, history_limit: usize) -> JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let store = state.dashboard.lock().await.store().clone();
            let mut recent = subscribe_recent(store, history_limit);
            while let Some(delivery) = recent.next().await {
                state.dashboard.lock().await.apply_delivery(delivery);
            }
            debug!("activity sync ended");
        })
    }
}
