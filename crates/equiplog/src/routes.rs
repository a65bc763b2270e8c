//! HTTP surface over the dashboard.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::{DateTime, Utc};
use equiplog_core::view::EXPORT_FILENAME;
use equiplog_core::{
    ActivityLogEntry, AuthError, DatasetStats, EntryKind, EquipmentPage, ExportError, Notice,
    SnapshotSummary, UploadError, UploadReceipt,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tracing::error;
use uuid::Uuid;

use crate::state::SharedState;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Upload(#[from] UploadError),

    #[error(transparent)]
    Export(#[from] ExportError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("statistics failed: {0}")]
    Stats(#[from] polars::prelude::PolarsError),

    #[error("invalid upload: {0}")]
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::Upload(UploadError::Store(_)) => StatusCode::BAD_GATEWAY,
            ApiError::Upload(_) | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::BAD_GATEWAY,
            ApiError::Export(_) | ApiError::Stats(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!(error = %self, "request failed");
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

pub fn router(state: SharedState) -> Router {
    Router::new()
        .route("/datasets", post(upload_json))
        .route("/datasets/upload", post(upload_multipart))
        .route("/activity", get(activity))
        .route("/activity/{id}/restore", post(restore))
        .route("/equipment", get(equipment))
        .route("/equipment/next", post(next_page))
        .route("/equipment/prev", post(prev_page))
        .route("/equipment/export", get(export))
        .route("/equipment/stats", get(stats))
        .route("/notices", get(notices))
        .route("/session", get(session))
        .route("/session/logout", post(logout))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
pub struct UploadRequest {
    pub filename: String,
    pub contents: String,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub id: Uuid,
    pub filename: String,
    pub created_at: Option<DateTime<Utc>>,
    pub summary: SnapshotSummary,
    pub dropped_rows: usize,
    pub notices: Vec<Notice>,
}

impl UploadResponse {
    fn new(receipt: UploadReceipt, notices: Vec<Notice>) -> Self {
        Self {
            id: receipt.snapshot.id,
            filename: receipt.snapshot.filename,
            created_at: receipt.snapshot.created_at,
            summary: receipt.snapshot.summary,
            dropped_rows: receipt.dropped_rows,
            notices,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ActivityEntryView {
    pub id: Uuid,
    pub time: String,
    pub message: String,
    pub kind: EntryKind,
    pub restorable: bool,
    pub record_count: usize,
}

impl From<&ActivityLogEntry> for ActivityEntryView {
    fn from(entry: &ActivityLogEntry) -> Self {
        Self {
            id: entry.id,
            time: entry.time.clone(),
            message: entry.message.clone(),
            kind: entry.kind,
            restorable: entry.is_restorable(),
            record_count: entry.record_count(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct EquipmentQuery {
    pub search: Option<String>,
    pub critical_only: Option<bool>,
    pub page: Option<usize>,
}

async fn upload_json(
    State(state): State<SharedState>,
    Json(request): Json<UploadRequest>,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    ingest(&state, &request.filename, request.contents.as_bytes()).await
}

async fn upload_multipart(
    State(state): State<SharedState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| ApiError::BadRequest(err.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let filename = field.file_name().unwrap_or("upload.csv").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|err| ApiError::BadRequest(err.to_string()))?;
        return ingest(&state, &filename, &bytes).await;
    }
    Err(ApiError::BadRequest("missing 'file' field".to_string()))
}

async fn ingest(
    state: &SharedState,
    filename: &str,
    contents: &[u8],
) -> Result<(StatusCode, Json<UploadResponse>), ApiError> {
    let (prepared, store) = {
        let dashboard = state.dashboard.lock().await;
        (dashboard.prepare_upload(filename, contents)?, dashboard.store().clone())
    };
    // Saving can wait on the database; other requests keep the dashboard meanwhile.
    let saved = store.save(&prepared.filename, &prepared.records).await;
    let receipt = state.dashboard.lock().await.commit_upload(prepared, saved)?;
    let notices = state.notices.drain();
    Ok((StatusCode::CREATED, Json(UploadResponse::new(receipt, notices))))
}

async fn activity(State(state): State<SharedState>) -> Json<Vec<ActivityEntryView>> {
    let dashboard = state.dashboard.lock().await;
    let entries = dashboard
        .activity()
        .entries()
        .into_iter()
        .map(ActivityEntryView::from)
        .collect();
    Json(entries)
}

async fn restore(
    State(state): State<SharedState>,
    Path(id): Path<Uuid>,
) -> Json<serde_json::Value> {
    let mut dashboard = state.dashboard.lock().await;
    let restored = dashboard.restore(id);
    Json(json!({
        "restored": restored,
        "page": dashboard.view().current(),
    }))
}

async fn equipment(
    State(state): State<SharedState>,
    Query(query): Query<EquipmentQuery>,
) -> Json<EquipmentPage> {
    let mut dashboard = state.dashboard.lock().await;
    let view = dashboard.view_mut();
    if let Some(search) = &query.search {
        view.set_search_term(search);
    }
    if let Some(critical_only) = query.critical_only {
        view.set_critical_only(critical_only);
    }
    if let Some(page) = query.page {
        view.go_to_page(page);
    }
    Json(view.current())
}

async fn next_page(State(state): State<SharedState>) -> Json<EquipmentPage> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.view_mut().next();
    Json(dashboard.view().current())
}

async fn prev_page(State(state): State<SharedState>) -> Json<EquipmentPage> {
    let mut dashboard = state.dashboard.lock().await;
    dashboard.view_mut().prev();
    Json(dashboard.view().current())
}

async fn export(State(state): State<SharedState>) -> Result<Response, ApiError> {
    let csv = state.dashboard.lock().await.view().export_csv()?;
    let Some(csv) = csv else {
        return Ok(StatusCode::NO_CONTENT.into_response());
    };

    let disposition = format!("attachment; filename=\"{EXPORT_FILENAME}\"");
    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        csv,
    )
        .into_response())
}

async fn stats(State(state): State<SharedState>) -> Result<Json<DatasetStats>, ApiError> {
    let stats = state.dashboard.lock().await.stats()?;
    Ok(Json(stats))
}

async fn notices(State(state): State<SharedState>) -> Json<Vec<Notice>> {
    Json(state.notices.drain())
}

async fn session(State(state): State<SharedState>) -> Json<serde_json::Value> {
    let dashboard = state.dashboard.lock().await;
    let session = dashboard.session();
    Json(json!({
        "display_name": session.display_name(),
        "signed_in": session.is_signed_in(),
    }))
}

async fn logout(State(state): State<SharedState>) -> Result<StatusCode, ApiError> {
    state.dashboard.lock().await.logout().await?;
    Ok(StatusCode::NO_CONTENT)
}
