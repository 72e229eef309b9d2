use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use log::info;
use serde::Serialize;

use logwarden::{ConfigStore, Database, LogNotifier, Monitor};

#[derive(Parser)]
#[command(name = "logwarden", version, about = "Watch log files for known errors")]
struct Cli {
    /// SQLite database holding detected occurrences
    #[arg(long, default_value = "logwarden.sqlite3")]
    db: PathBuf,

    /// JSON settings file
    #[arg(long, default_value = "config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Tail the given files until interrupted
    Watch {
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },
    /// List the most recent occurrences
    Recent {
        #[arg(long, default_value_t = 50)]
        limit: usize,
    },
    /// Show one occurrence in full
    Show { id: i64 },
    /// Mark an occurrence as reviewed
    Review { id: i64 },
    /// Aggregate counts
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging (reads RUST_LOG env var)
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let cli = Cli::parse();

    let config = ConfigStore::new(cli.config.clone())?.get();
    let db = Database::new(cli.db.clone())?;
    let notifier = Arc::new(LogNotifier::new(config.email_address.clone()));
    let monitor = Monitor::from_config(db, &config, notifier)?;

    match cli.command {
        Command::Watch { files } => watch(&monitor, files).await,
        Command::Recent { limit } => print_json(&monitor.list_recent(limit).await?),
        Command::Show { id } => match monitor.get_occurrence(id).await? {
            Some(occurrence) => print_json(&occurrence),
            None => bail!("occurrence {id} not found"),
        },
        Command::Review { id } => {
            if !monitor.mark_reviewed(id).await? {
                bail!("occurrence {id} not found");
            }
            Ok(())
        }
        Command::Stats => print_json(&monitor.get_stats().await?),
    }
}

async fn watch(monitor: &Monitor, files: Vec<PathBuf>) -> Result<()> {
    let status = monitor.start_monitoring(files).await;
    if !status.is_success() {
        bail!(
            "failed to start monitoring: {}",
            status.message.unwrap_or_default()
        );
    }

    info!("logwarden watching; press Ctrl-C to stop");
    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl-C")?;

    let status = monitor.stop_monitoring().await;
    if !status.is_success() {
        bail!(
            "failed to stop monitoring: {}",
            status.message.unwrap_or_default()
        );
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
