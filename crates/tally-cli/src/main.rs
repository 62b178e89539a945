mod commands;
mod config;

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tracing::debug;

use tally_db::Database;

use crate::commands::Command;
use crate::config::Config;

#[derive(Debug, Parser)]
#[command(name = "tally", version, about = "Habit tracking with streaks and mood summaries")]
struct Cli {
    /// Database file, overrides TALLY_DB_PATH
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging. Stdout carries the JSON output, so logs go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "tally_cli=info,tally_db=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    // Config
    let mut config = Config::load()?;
    if let Some(path) = cli.db {
        config.db_path = path;
    }
    debug!(
        "Using database {} (lookback {} days, {} summary weeks)",
        config.db_path.display(),
        config.lookback_days,
        config.summary_weeks
    );

    // Init database
    let db = Arc::new(Database::open(&config.db_path)?);

    let output = commands::run(cli.command, db, &config).await?;
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}
