//! Upload, sync and restore workflow tying the parser, store, activity log
//! and view model together.

use std::path::Path;
use std::sync::Arc;

use equiplog_parser::{parse_equipment_csv, EquipmentRecord, ParserError};
use polars::prelude::PolarsResult;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::activity::ActivityLog;
use crate::error::{AuthError, StoreError, UploadError};
use crate::notify::{Notice, Notifier};
use crate::session::Session;
use crate::snapshot::Snapshot;
use crate::stats::DatasetStats;
use crate::store::SnapshotStore;
use crate::subscription::Delivery;
use crate::view::EquipmentView;

pub const NO_VALID_ROWS: &str = "Failed to parse CSV: No valid rows found.";

#[derive(Debug, Clone)]
pub struct UploadReceipt {
    pub snapshot: Snapshot,
    /// Rows skipped for having fewer cells than the header.
    pub dropped_rows: usize,
}

/// A parsed upload waiting for its snapshot to be saved.
#[derive(Debug, Clone)]
pub struct PreparedUpload {
    pub filename: String,
    pub records: Vec<EquipmentRecord>,
    pub dropped_rows: usize,
}

pub struct Dashboard {
    store: Arc<dyn SnapshotStore>,
    notifier: Arc<dyn Notifier>,
    session: Session,
    view: EquipmentView,
    activity: ActivityLog,
}

impl Dashboard {
    pub fn new(store: Arc<dyn SnapshotStore>, notifier: Arc<dyn Notifier>, session: Session) -> Self {
        Self {
            store,
            notifier,
            session,
            view: EquipmentView::default(),
            activity: ActivityLog::new(),
        }
    }

    pub fn store(&self) -> &Arc<dyn SnapshotStore> {
        &self.store
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn view(&self) -> &EquipmentView {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut EquipmentView {
        &mut self.view
    }

    pub fn activity(&self) -> &ActivityLog {
        &self.activity
    }

    /// Parse an uploaded file, persist it, and make it the active set.
    ///
    /// The active set only changes once the store accepted the snapshot.
    pub async fn upload(&mut self, filename: &str, contents: &[u8]) -> Result<UploadReceipt, UploadError> {
        let prepared = self.prepare_upload(filename, contents)?;
        let saved = self.store.save(&prepared.filename, &prepared.records).await;
        self.commit_upload(prepared, saved)
    }

    /// Validate and parse an upload without touching the store or the
    /// active set. Pair with [`Dashboard::commit_upload`] once the save
    /// has settled; callers sharing the dashboard can save in between
    /// without holding it.
    pub fn prepare_upload(&self, filename: &str, contents: &[u8]) -> Result<PreparedUpload, UploadError> {
        if !is_csv(filename) {
            self.notify(Notice::error(format!("Only .csv files are supported, got '{filename}'")));
            return Err(UploadError::UnsupportedFile(filename.to_string()));
        }

        let text = std::str::from_utf8(contents).map_err(|source| {
            self.notify(Notice::error(format!("Failed to read '{filename}': not UTF-8 text")));
            UploadError::InvalidEncoding {
                filename: filename.to_string(),
                source,
            }
        })?;

        self.notify(Notice::info("Reading file..."));
        let parsed = match parse_equipment_csv(text) {
            Ok(parsed) => parsed,
            Err(err) => {
                warn!(filename, error = %err, "upload rejected");
                let message = match &err {
                    ParserError::Csv { .. } => format!("Failed to parse CSV: {err}"),
                    ParserError::MissingHeader | ParserError::NoQualifyingRows { .. } => {
                        NO_VALID_ROWS.to_string()
                    }
                };
                self.notify(Notice::error(message));
                return Err(err.into());
            }
        };

        if parsed.dropped_rows > 0 {
            debug!(filename, dropped = parsed.dropped_rows, "short rows skipped");
        }

        self.notify(Notice::info("Saving to Database..."));
        Ok(PreparedUpload {
            filename: filename.to_string(),
            records: parsed.records,
            dropped_rows: parsed.dropped_rows,
        })
    }

    /// Finish an upload with the outcome of saving its records.
    pub fn commit_upload(
        &mut self,
        prepared: PreparedUpload,
        saved: Result<Snapshot, StoreError>,
    ) -> Result<UploadReceipt, UploadError> {
        let filename = prepared.filename.as_str();
        let snapshot = match saved {
            Ok(snapshot) => snapshot,
            Err(err) => {
                error!(filename, error = %err, "snapshot save failed");
                self.notify(Notice::error(format!("Upload Failed: {err}")));
                return Err(err.into());
            }
        };

        self.view.replace_records(prepared.records);
        self.notify(Notice::success(format!("Success! \"{filename}\" saved to Database.")));

        let critical = snapshot.summary.critical;
        if critical > 0 {
            self.activity
                .push_notice(format!("System Update: {critical} critical items detected"));
        }

        info!(
            id = %snapshot.id,
            filename,
            total = snapshot.summary.total,
            critical,
            "upload saved"
        );

        Ok(UploadReceipt {
            snapshot,
            dropped_rows: prepared.dropped_rows,
        })
    }

    /// Fold one subscription delivery into the activity log. Errors leave the
    /// previous entries in place.
    pub fn apply_delivery(&mut self, delivery: Delivery) {
        match delivery {
            Ok(snapshots) => {
                debug!(count = snapshots.len(), "activity log refreshed");
                self.activity.replace_uploads(&snapshots);
            }
            Err(err) => {
                warn!(error = %err, "snapshot subscription error");
                self.notify(Notice::error(format!("Sync Error: {err}")));
            }
        }
    }

    /// Restore the records of an upload entry. Returns `false` (and changes
    /// nothing) for unknown ids and entries without a payload.
    pub fn restore(&mut self, id: Uuid) -> bool {
        let Some(entry) = self.activity.find(id) else {
            return false;
        };
        if !self.view.restore(entry) {
            return false;
        }

        let message = format!("Restored data from {}", entry.time);
        info!(%id, records = self.view.records().len(), "snapshot restored");
        self.notify(Notice::success(message));
        true
    }

    pub fn stats(&self) -> PolarsResult<DatasetStats> {
        DatasetStats::from_records(self.view.records())
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        self.session.logout().await.inspect_err(|err| {
            self.notify(Notice::error(format!("Failed to logout: {err}")));
        })
    }

    fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }
}

fn is_csv(filename: &str) -> bool {
    Path::new(filename)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
