use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Result};
use equiplog_core::{Config, Dashboard, Session, SnapshotStore, TracingNotifier};

/// Upload each file through the dashboard workflow; one bad file does not
/// stop the rest.
pub async fn handle_ingest(
    config: &Config,
    store: Arc<dyn SnapshotStore>,
    files: &[PathBuf],
) -> Result<()> {
    let mut dashboard = Dashboard::new(
        store,
        Arc::new(TracingNotifier),
        Session::local(config.operator.clone()),
    );

    let mut saved = 0;
    let mut failed = 0;

    for path in files {
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let contents = match std::fs::read(path) {
            Ok(contents) => contents,
            Err(err) => {
                eprintln!("{}: could not read file: {err}", path.display());
                failed += 1;
                continue;
            }
        };

        match dashboard.upload(&filename, &contents).await {
            Ok(receipt) => {
                println!(
                    "{filename}: saved {} records ({} critical, {} short rows skipped) as {}",
                    receipt.snapshot.summary.total,
                    receipt.snapshot.summary.critical,
                    receipt.dropped_rows,
                    receipt.snapshot.id,
                );
                saved += 1;
            }
            Err(err) => {
                eprintln!("{filename}: {err}");
                failed += 1;
            }
        }
    }

    println!("\nSaved: {saved}  Failed: {failed}");
    if saved == 0 {
        bail!("no files were ingested");
    }
    Ok(())
}
