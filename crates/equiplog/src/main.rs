use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use equiplog_core::{db, Config, InMemorySnapshotStore, PostgresSnapshotStore, SnapshotStore};

mod commands;
use commands::inspect::{handle_history, handle_parse, handle_watch};
use commands::ingest::handle_ingest;
use commands::serve::handle_serve;

/// Equipment readings dashboard: ingest CSV files, keep snapshot history,
/// and serve the operator API.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// TOML config file; environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Keep snapshots in process memory instead of Postgres.
    #[arg(long, global = true)]
    memory: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Subcommand, Debug)]
enum Commands {
    /// Run the HTTP API.
    Serve,
    /// Apply database migrations.
    Migrate,
    /// Parse files and save each one as a snapshot.
    Ingest {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// Parse a file and print its records without saving.
    Parse { file: PathBuf },
    /// List the most recent snapshots.
    History {
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Print the recent-snapshot list every time it changes.
    Watch,
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    equiplog::telemetry::init();

    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Parse { file } => handle_parse(&file)?,
        Commands::Migrate => {
            let url = database_url(&config)?;
            let pool = db::connect(url).await?;
            db::run_migrations(&pool).await?;
            println!("Migrations applied.");
        }
        Commands::Serve => {
            let store = open_store(&config, cli.memory).await?;
            handle_serve(&config, store).await?;
        }
        Commands::Ingest { files } => {
            let store = open_store(&config, cli.memory).await?;
            handle_ingest(&config, store, &files).await?;
        }
        Commands::History { limit } => {
            let store = open_store(&config, cli.memory).await?;
            handle_history(store, limit.unwrap_or(config.history_limit)).await?;
        }
        Commands::Watch => {
            let store = open_store(&config, cli.memory).await?;
            handle_watch(store, config.history_limit).await?;
        }
    }

    Ok(())
}

fn database_url(config: &Config) -> Result<&str> {
    config
        .database_url
        .as_deref()
        .context("no database configured; set EQUIPLOG_DATABASE_URL or DATABASE_URL, or pass --memory")
}

async fn open_store(config: &Config, memory: bool) -> Result<Arc<dyn SnapshotStore>> {
    if memory {
        tracing::info!("using in-memory snapshot store");
        return Ok(Arc::new(InMemorySnapshotStore::new()));
    }

    let pool = db::connect(database_url(config)?).await?;
    db::run_migrations(&pool).await?;
    Ok(Arc::new(PostgresSnapshotStore::new(pool)))
}
