use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use dumpr_core::options::{DEFAULT_BATCH_ROWS, DEFAULT_VOLUME_SIZE_MB};

#[derive(Parser)]
#[command(author, version, about = "dumpr dev CLI: stepwise SQL backup and restore", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Args, Clone, Debug)]
pub struct BackupArgs {
    /// SQLite database to back up
    pub db: PathBuf,
    /// Directory receiving the `<table>#<n>.sql` volumes
    pub dir: PathBuf,
    /// Resume token file (defaults to `<dir>/.dumpr-backup.json`)
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Ignore any saved resume token and start from the first table
    #[arg(long)]
    pub fresh: bool,
    /// Roll over to a new volume once the active one reaches this size
    #[arg(long, default_value_t = DEFAULT_VOLUME_SIZE_MB)]
    pub volume_size_mb: u64,
    /// Rows per INSERT statement (one batch per tick)
    #[arg(long, default_value_t = DEFAULT_BATCH_ROWS)]
    pub batch_rows: u64,
    /// Back up schema only, for every table
    #[arg(long)]
    pub only_structure: bool,
    /// Back up schema only for this table (repeatable)
    #[arg(long = "structure-only", value_name = "TABLE")]
    pub structure_only: Vec<String>,
    /// Explicit table order (repeatable); default is the database listing
    #[arg(long = "table", value_name = "TABLE")]
    pub tables: Vec<String>,
}

#[derive(Args, Clone, Debug)]
pub struct RestoreArgs {
    /// SQLite database to restore into
    pub db: PathBuf,
    /// Directory holding the volumes
    pub dir: PathBuf,
    /// Resume token file (defaults to `<dir>/.dumpr-restore.json`)
    #[arg(long)]
    pub state: Option<PathBuf>,
    /// Ignore any saved resume token and replay from the first volume
    #[arg(long)]
    pub fresh: bool,
}

#[derive(Subcommand)]
pub enum BackupCommands {
    /// Perform one tick and save the resume token
    Step(BackupArgs),
    /// Tick until the backup reaches 100%
    Run(BackupArgs),
}

#[derive(Subcommand)]
pub enum RestoreCommands {
    /// Replay one volume and save the resume token
    Step(RestoreArgs),
    /// Replay every remaining volume
    Run(RestoreArgs),
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(subcommand)]
    /// Dump schema and rows into size-bounded SQL volumes
    Backup(BackupCommands),

    #[command(subcommand)]
    /// Replay volumes into a database
    Restore(RestoreCommands),

    /// Print volumes in restore order
    Ls { dir: PathBuf },
}
