pub mod handlers;
pub mod state;

use crate::presentation::cli::{BackupCommands, Cli, Commands, RestoreCommands};
use clap::Parser;
use dumpr_core::error::Result;

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Backup(cmd) => match cmd {
            BackupCommands::Step(args) => handlers::handle_backup_step(args),
            BackupCommands::Run(args) => handlers::handle_backup_run(args),
        },
        Commands::Restore(cmd) => match cmd {
            RestoreCommands::Step(args) => handlers::handle_restore_step(args),
            RestoreCommands::Run(args) => handlers::handle_restore_run(args),
        },
        Commands::Ls { dir } => handlers::handle_ls(dir),
    }
}
