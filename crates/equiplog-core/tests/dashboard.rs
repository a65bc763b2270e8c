use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use equiplog_core::activity::JUST_NOW;
use equiplog_core::dashboard::NO_VALID_ROWS;
use equiplog_core::{
    subscribe_recent, Dashboard, EntryKind, InMemorySnapshotStore, NoticeBuffer, NoticeKind,
    Session, SnapshotStore, StoreError, UploadError,
};
use tokio::time::timeout;

const PUMP_NINE: &str = "Equipment,Kind,Flow,Press,Temperature\nPump-9,Centrifugal,10,16,90\n";
const WAIT: Duration = Duration::from_secs(2);

fn dashboard() -> (Dashboard, Arc<InMemorySnapshotStore>, NoticeBuffer) {
    let store = Arc::new(InMemorySnapshotStore::new());
    let notices = NoticeBuffer::new();
    let dashboard = Dashboard::new(store.clone(), Arc::new(notices.clone()), Session::local("Admin"));
    (dashboard, store, notices)
}

async fn sync(dashboard: &mut Dashboard) -> Result<()> {
    let mut recent = subscribe_recent(dashboard.store().clone(), 5);
    let delivery = timeout(WAIT, recent.next()).await?.expect("delivery");
    dashboard.apply_delivery(delivery);
    Ok(())
}

#[tokio::test]
async fn pump_nine_upload_end_to_end() -> Result<()> {
    let (mut dashboard, _store, notices) = dashboard();

    let receipt = dashboard.upload("plant_a.csv", PUMP_NINE.as_bytes()).await?;
    assert_eq!(receipt.snapshot.summary.total, 1);
    assert_eq!(receipt.snapshot.summary.critical, 1);
    assert_eq!(receipt.dropped_rows, 0);

    let record = &dashboard.view().records()[0];
    assert_eq!(record.pressure, "16");
    assert_eq!(record.temp, "90");
    assert!(record.status.is_critical());

    let messages: Vec<String> = notices.drain().into_iter().map(|n| n.message).collect();
    assert_eq!(
        messages,
        [
            "Reading file...",
            "Saving to Database...",
            "Success! \"plant_a.csv\" saved to Database.",
        ]
    );

    sync(&mut dashboard).await?;
    let entries = dashboard.activity().entries();
    let top_upload = entries
        .iter()
        .find(|e| e.kind == EntryKind::User)
        .expect("upload entry");
    assert!(top_upload.message.contains("plant_a.csv"));

    let notice = dashboard.activity().notices().next().expect("system notice");
    assert_eq!(notice.message, "System Update: 1 critical items detected");
    Ok(())
}

#[tokio::test]
async fn unparseable_upload_keeps_active_set() -> Result<()> {
    let (mut dashboard, store, notices) = dashboard();
    dashboard.upload("good.csv", PUMP_NINE.as_bytes()).await?;
    notices.drain();

    let err = dashboard
        .upload("bad.csv", b"name,type,flow,pressure,temp\nonly,two\n")
        .await
        .expect_err("no qualifying rows");
    assert!(matches!(err, UploadError::Parse(_)));
    assert_eq!(dashboard.view().records()[0].name, "Pump-9");
    assert_eq!(store.len(), 1);

    let last = notices.latest().expect("notice");
    assert_eq!(last.message, NO_VALID_ROWS);
    assert_eq!(last.kind, NoticeKind::Error);
    Ok(())
}

#[tokio::test]
async fn save_failure_does_not_apply_records() -> Result<()> {
    let (mut dashboard, store, notices) = dashboard();
    store.fail_writes(Some("permission denied"));

    let err = dashboard
        .upload("plant_a.csv", PUMP_NINE.as_bytes())
        .await
        .expect_err("store rejects");
    assert!(matches!(err, UploadError::Store(StoreError::Unavailable(_))));
    assert!(dashboard.view().records().is_empty());
    assert!(dashboard.activity().notices().next().is_none());

    let last = notices.latest().expect("notice");
    assert_eq!(last.message, "Upload Failed: store unavailable: permission denied");
    Ok(())
}

#[tokio::test]
async fn prepared_upload_applies_only_on_commit() -> Result<()> {
    let (mut dashboard, store, _notices) = dashboard();

    let prepared = dashboard.prepare_upload("plant_a.csv", PUMP_NINE.as_bytes())?;
    assert_eq!(prepared.records.len(), 1);
    assert!(store.is_empty());
    assert!(dashboard.view().records().is_empty());

    let saved = dashboard.store().save(&prepared.filename, &prepared.records).await;
    let receipt = dashboard.commit_upload(prepared, saved)?;
    assert_eq!(receipt.snapshot.filename, "plant_a.csv");
    assert_eq!(store.len(), 1);
    assert_eq!(dashboard.view().records().len(), 1);
    Ok(())
}

#[tokio::test]
async fn non_csv_and_non_utf8_are_rejected_up_front() -> Result<()> {
    let (mut dashboard, store, _notices) = dashboard();

    let err = dashboard.upload("readings.xlsx", b"whatever").await.expect_err("extension");
    assert!(matches!(err, UploadError::UnsupportedFile(_)));

    let err = dashboard.upload("readings.CSV", &[0xff, 0xfe, 0x00]).await.expect_err("encoding");
    assert!(matches!(err, UploadError::InvalidEncoding { .. }));

    assert!(store.is_empty());
    Ok(())
}

#[tokio::test]
async fn sync_error_keeps_last_good_log() -> Result<()> {
    let (mut dashboard, store, notices) = dashboard();
    dashboard.upload("a.csv", PUMP_NINE.as_bytes()).await?;
    sync(&mut dashboard).await?;
    assert_eq!(dashboard.activity().uploads().len(), 1);

    store.fail_reads(Some("offline"));
    sync(&mut dashboard).await?;
    assert_eq!(dashboard.activity().uploads().len(), 1);
    assert_eq!(
        notices.latest().expect("notice").message,
        "Sync Error: store unavailable: offline"
    );
    Ok(())
}

#[tokio::test]
async fn restore_from_history() -> Result<()> {
    let (mut dashboard, store, notices) = dashboard();
    store.defer_timestamps(true);
    dashboard.upload("first.csv", PUMP_NINE.as_bytes()).await?;
    dashboard
        .upload("second.csv", b"name,type,flow,pressure,temp\nTank-1,Storage,1,2,3\nTank-2,Storage,1,2,3\n")
        .await?;
    sync(&mut dashboard).await?;

    let first = dashboard
        .activity()
        .uploads()
        .iter()
        .find(|e| e.message.contains("first.csv"))
        .expect("history entry")
        .clone();
    assert_eq!(first.time, JUST_NOW);

    assert!(dashboard.restore(first.id));
    assert_eq!(dashboard.view().records().len(), 1);
    assert_eq!(
        notices.latest().expect("notice").message,
        format!("Restored data from {JUST_NOW}")
    );

    let notice_id = dashboard.activity().notices().next().expect("notice").id;
    assert!(!dashboard.restore(notice_id));
    assert!(!dashboard.restore(uuid::Uuid::new_v4()));
    assert_eq!(dashboard.view().records()[0].name, "Pump-9");
    Ok(())
}

#[tokio::test]
async fn logout_failure_is_reported() -> Result<()> {
    let (dashboard, _store, notices) = dashboard();
    assert!(dashboard.session().is_signed_in());
    dashboard.logout().await?;
    assert!(!dashboard.session().is_signed_in());

    dashboard.logout().await.expect_err("second logout");
    assert_eq!(
        notices.latest().expect("notice").message,
        "Failed to logout: session is already signed out"
    );
    Ok(())
}

#[tokio::test]
async fn stats_follow_the_active_set() -> Result<()> {
    let (mut dashboard, _store, _notices) = dashboard();
    dashboard.upload("plant.csv", PUMP_NINE.as_bytes()).await?;

    let stats = dashboard.stats()?;
    assert_eq!(stats.total, 1);
    assert_eq!(stats.critical, 1);
    assert!((stats.average_pressure - 16.0).abs() < 1e-9);
    assert!((stats.average_temp - 90.0).abs() < 1e-9);
    Ok(())
}
