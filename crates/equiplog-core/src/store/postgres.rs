use async_trait::async_trait;
use chrono::{DateTime, Utc};
use equiplog_parser::EquipmentRecord;
use futures::StreamExt;
use sqlx::postgres::{PgListener, PgRow};
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use super::{ChangeFeed, SnapshotStore};
use crate::error::StoreError;
use crate::snapshot::{Snapshot, SnapshotSummary};

/// NOTIFY channel raised in the same transaction as each insert.
pub const CHANGE_CHANNEL: &str = "datasets_changed";

#[derive(Clone)]
pub struct PostgresSnapshotStore {
    pool: PgPool,
}

impl PostgresSnapshotStore {
    /// Wrap a pool from [`crate::db::connect`]; migrations must already be applied.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SnapshotStore for PostgresSnapshotStore {
    async fn save(
        &self,
        filename: &str,
        records: &[EquipmentRecord],
    ) -> Result<Snapshot, StoreError> {
        let id = Uuid::new_v4();
        let summary = SnapshotSummary::from_records(records);

        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(
            r#"
            INSERT INTO datasets (id, filename, parsed_data, summary)
            VALUES ($1, $2, $3, $4)
            RETURNING created_at
            "#,
        )
        .bind(id)
        .bind(filename)
        .bind(Json(records))
        .bind(Json(summary))
        .fetch_one(&mut *tx)
        .await?;
        let created_at: Option<DateTime<Utc>> = row.try_get("created_at")?;

        sqlx::query("SELECT pg_notify($1, $2)")
            .bind(CHANGE_CHANNEL)
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        debug!(%id, filename, total = summary.total, "snapshot inserted");

        Ok(Snapshot {
            id,
            filename: filename.to_string(),
            created_at,
            records: records.to_vec(),
            summary,
        })
    }

    async fn recent(&self, limit: usize) -> Result<Vec<Snapshot>, StoreError> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = sqlx::query(
            r#"
            SELECT id, filename, created_at, parsed_data, summary
            FROM datasets
            ORDER BY created_at DESC NULLS FIRST
            LIMIT $1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(snapshot_from_row).collect()
    }

    async fn changes(&self) -> Result<ChangeFeed, StoreError> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(CHANGE_CHANNEL).await?;

        let feed = listener.into_stream().map(|event| {
            event
                .map(|notification| {
                    debug!(payload = notification.payload(), "datasets changed");
                })
                .map_err(StoreError::from)
        });
        Ok(feed.boxed())
    }
}

fn snapshot_from_row(row: &PgRow) -> Result<Snapshot, StoreError> {
    let Json(records): Json<Vec<EquipmentRecord>> = row.try_get("parsed_data")?;
    let Json(summary): Json<SnapshotSummary> = row.try_get("summary")?;

    Ok(Snapshot {
        id: row.try_get("id")?,
        filename: row.try_get("filename")?,
        created_at: row.try_get("created_at")?,
        records,
        summary,
    })
}
