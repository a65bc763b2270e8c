use std::sync::Arc;

use anyhow::Result;
use equiplog::{router, AppState};
use equiplog_core::{Config, Dashboard, NoticeBuffer, Session, SnapshotStore};
use tokio::net::TcpListener;
use tracing::info;

pub async fn handle_serve(config: &Config, store: Arc<dyn SnapshotStore>) -> Result<()> {
    let notices = NoticeBuffer::new();
    let dashboard = Dashboard::new(
        store,
        Arc::new(notices.clone()),
        Session::local(config.operator.clone()),
    );
    let state = AppState::new(dashboard, notices);
    let sync = state.spawn_sync(config.history_limit);

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!("listening on {}", listener.local_addr()?);

    let served = axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown requested");
        })
        .await;

    sync.abort();
    served?;
    Ok(())
}
