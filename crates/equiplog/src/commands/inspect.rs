use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use comfy_table::Table;
use equiplog_core::activity::project_snapshot;
use equiplog_core::parser::parse_equipment_csv;
use equiplog_core::{subscribe_recent, Snapshot, SnapshotStore};

pub fn handle_parse(path: &Path) -> Result<()> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let parsed = parse_equipment_csv(&text)?;

    let mut table = Table::new();
    table.set_header(vec!["Name", "Type", "Flow", "Pressure", "Temp", "Status"]);
    for record in &parsed.records {
        table.add_row(record.values().to_vec());
    }
    println!("{table}");
    println!(
        "{} records, {} critical, {} short rows skipped",
        parsed.records.len(),
        parsed.critical_count(),
        parsed.dropped_rows
    );
    Ok(())
}

pub async fn handle_history(store: Arc<dyn SnapshotStore>, limit: usize) -> Result<()> {
    let snapshots = store.recent(limit).await?;
    if snapshots.is_empty() {
        println!("No snapshots yet.");
        return Ok(());
    }
    println!("{}", history_table(&snapshots));
    Ok(())
}

pub async fn handle_watch(store: Arc<dyn SnapshotStore>, limit: usize) -> Result<()> {
    let mut recent = subscribe_recent(store, limit);
    loop {
        tokio::select! {
            delivery = recent.next() => match delivery {
                Some(Ok(snapshots)) => println!("{}", history_table(&snapshots)),
                Some(Err(err)) => eprintln!("Sync Error: {err}"),
                None => break,
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }
    recent.cancel();
    Ok(())
}

fn history_table(snapshots: &[Snapshot]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Time", "Activity", "Records", "Critical", "Id"]);
    for snapshot in snapshots {
        let entry = project_snapshot(snapshot);
        table.add_row(vec![
            entry.time,
            entry.message,
            snapshot.summary.total.to_string(),
            snapshot.summary.critical.to_string(),
            snapshot.id.to_string(),
        ]);
    }
    table
}
