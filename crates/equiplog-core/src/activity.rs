//! The activity log shown beside the equipment table.
//!
//! Upload entries are projected from the latest snapshot delivery and are
//! replaced wholesale on each one. System notices are local to the session,
//! capped, and never restorable.

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt::Display;

use chrono::{DateTime, Local, TimeZone, Utc};
use equiplog_parser::EquipmentRecord;
use serde::Serialize;
use uuid::Uuid;

use crate::snapshot::Snapshot;

/// Shown while a snapshot's timestamp has not materialised.
pub const JUST_NOW: &str = "Just now";

pub const MAX_NOTICES: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ActivityLogEntry {
    pub id: Uuid,
    /// Local wall-clock `HH:MM`, or [`JUST_NOW`].
    pub time: String,
    pub message: String,
    pub kind: EntryKind,
    /// Records to restore; only upload entries carry one.
    pub payload: Option<Vec<EquipmentRecord>>,
    at: Option<DateTime<Utc>>,
}

impl ActivityLogEntry {
    pub fn is_restorable(&self) -> bool {
        self.payload.is_some()
    }

    pub fn record_count(&self) -> usize {
        self.payload.as_ref().map_or(0, Vec::len)
    }
}

pub fn format_entry_time<Tz>(created_at: Option<DateTime<Utc>>, tz: &Tz) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    match created_at {
        Some(at) => at.with_timezone(tz).format("%H:%M").to_string(),
        None => JUST_NOW.to_string(),
    }
}

/// Turn a stored snapshot into its log entry, formatting time in `tz`.
pub fn project_snapshot_in<Tz>(snapshot: &Snapshot, tz: &Tz) -> ActivityLogEntry
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    ActivityLogEntry {
        id: snapshot.id,
        time: format_entry_time(snapshot.created_at, tz),
        message: format!("User uploaded '{}'", snapshot.filename),
        kind: EntryKind::User,
        payload: Some(snapshot.records.clone()),
        at: snapshot.created_at,
    }
}

pub fn project_snapshot(snapshot: &Snapshot) -> ActivityLogEntry {
    project_snapshot_in(snapshot, &Local)
}

#[derive(Debug, Clone, Default)]
pub struct ActivityLog {
    uploads: Vec<ActivityLogEntry>,
    notices: VecDeque<ActivityLogEntry>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the upload entries with a fresh delivery, keeping its order.
    /// An empty delivery clears them.
    pub fn replace_uploads(&mut self, snapshots: &[Snapshot]) {
        self.replace_uploads_in(snapshots, &Local);
    }

    pub fn replace_uploads_in<Tz>(&mut self, snapshots: &[Snapshot], tz: &Tz)
    where
        Tz: TimeZone,
        Tz::Offset: Display,
    {
        self.uploads = snapshots
            .iter()
            .map(|snapshot| project_snapshot_in(snapshot, tz))
            .collect();
    }

    /// Record a system notice; the oldest is evicted past [`MAX_NOTICES`].
    pub fn push_notice(&mut self, message: impl Into<String>) -> &ActivityLogEntry {
        let now = Utc::now();
        self.notices.push_front(ActivityLogEntry {
            id: Uuid::new_v4(),
            time: format_entry_time(Some(now), &Local),
            message: message.into(),
            kind: EntryKind::System,
            payload: None,
            at: Some(now),
        });
        self.notices.truncate(MAX_NOTICES);
        &self.notices[0]
    }

    /// Upload entries as last delivered, newest first.
    pub fn uploads(&self) -> &[ActivityLogEntry] {
        &self.uploads
    }

    pub fn notices(&self) -> impl Iterator<Item = &ActivityLogEntry> {
        self.notices.iter()
    }

    /// Uploads and notices merged newest first. Pending timestamps lead.
    pub fn entries(&self) -> Vec<&ActivityLogEntry> {
        let mut merged: Vec<&ActivityLogEntry> =
            self.notices.iter().chain(self.uploads.iter()).collect();
        merged.sort_by(|a, b| newest_first(a.at, b.at));
        merged
    }

    pub fn find(&self, id: Uuid) -> Option<&ActivityLogEntry> {
        self.uploads
            .iter()
            .chain(self.notices.iter())
            .find(|entry| entry.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.uploads.is_empty() && self.notices.is_empty()
    }
}

fn newest_first(a: Option<DateTime<Utc>>, b: Option<DateTime<Utc>>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(a), Some(b)) => b.cmp(&a),
    }
}
