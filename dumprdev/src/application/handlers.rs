use std::path::PathBuf;

use serde::Serialize;
use tracing::{info, warn};

use dumpr_core::db::Database;
use dumpr_core::db_factory::{Backend, OpenParams, open_database};
use dumpr_core::error::{DumpError, Result};
use dumpr_core::restore::locate::locate;
use dumpr_core::{
    BackupCursor, BackupEngine, BackupOptions, BackupProgress, RecoveryCursor, RecoveryEngine,
    RecoveryProgress,
};

use crate::application::state::{
    BACKUP_STATE, RESTORE_STATE, load_backup, load_restore, save_backup, save_restore, state_path,
};
use crate::presentation::cli::{BackupArgs, RestoreArgs};

fn db_from_path(db: PathBuf) -> Result<Box<dyn Database>> {
    open_database(Backend::Sqlite, &OpenParams { path: db })
}

fn options_from_args(args: &BackupArgs) -> Result<BackupOptions> {
    let mut opts = BackupOptions {
        dir: Some(args.dir.clone()),
        volume_size_mb: args.volume_size_mb,
        batch_rows: args.batch_rows,
        only_structure: args.only_structure,
        structure_only: args.structure_only.iter().cloned().collect(),
        tables: None,
    };
    if !args.tables.is_empty() {
        opts = opts.with_tables(args.tables.iter().cloned())?;
    }
    Ok(opts)
}

/// One JSON line per tick on stdout.
fn emit<T: Serialize>(progress: &T) -> Result<()> {
    let line = serde_json::to_string(progress)
        .map_err(|e| DumpError::Format(format!("progress: {e}")))?;
    println!("{line}");
    Ok(())
}

fn backup_ticks(args: BackupArgs, until_done: bool) -> Result<BackupProgress> {
    let options = options_from_args(&args)?;
    let state = state_path(args.state, &args.dir, BACKUP_STATE);
    let mut engine = BackupEngine::new(db_from_path(args.db)?, options)?;

    let mut cursor = if args.fresh {
        BackupCursor::default()
    } else {
        load_backup(&state)?
    };
    let resumed = cursor != BackupCursor::default();
    loop {
        let (next, progress) = engine.step(&cursor)?;
        if resumed && next == cursor && progress.is_done() {
            info!(
                state = %state.display(),
                "saved backup state is already complete, pass --fresh to start over"
            );
        }
        save_backup(&state, &next)?;
        emit(&progress)?;
        cursor = next;
        if !until_done || progress.is_done() {
            return Ok(progress);
        }
    }
}

pub fn handle_backup_step(args: BackupArgs) -> Result<()> {
    backup_ticks(args, false).map(|_| ())
}

pub fn handle_backup_run(args: BackupArgs) -> Result<()> {
    let dir = args.dir.clone();
    let last = backup_ticks(args, true)?;
    info!(dir = %dir.display(), tables = last.table_index + 1, "backup finished");
    Ok(())
}

fn restore_ticks(args: RestoreArgs, until_done: bool) -> Result<Vec<RecoveryProgress>> {
    let state = state_path(args.state, &args.dir, RESTORE_STATE);
    let mut engine = RecoveryEngine::new(db_from_path(args.db)?, &args.dir);

    let mut cursor = if args.fresh {
        RecoveryCursor::default()
    } else {
        load_restore(&state)?
    };
    let resumed = cursor != RecoveryCursor::default();
    let mut seen = Vec::new();
    loop {
        let (next, progress) = engine.step(&cursor)?;
        if resumed && seen.is_empty() && progress.is_done() {
            info!(
                state = %state.display(),
                "saved restore state is already complete, pass --fresh to start over"
            );
        }
        save_restore(&state, &next)?;
        emit(&progress)?;
        cursor = next;
        let done = progress.is_done();
        seen.push(progress);
        if !until_done || done {
            return Ok(seen);
        }
    }
}

pub fn handle_restore_step(args: RestoreArgs) -> Result<()> {
    for p in restore_ticks(args, false)?.iter().filter(|p| p.failed()) {
        warn!(file = p.file.as_deref().unwrap_or_default(), "volume was not fully applied");
    }
    Ok(())
}

pub fn handle_restore_run(args: RestoreArgs) -> Result<()> {
    let seen = restore_ticks(args, true)?;
    let failed: Vec<&str> = seen
        .iter()
        .filter(|p| p.failed())
        .filter_map(|p| p.file.as_deref())
        .collect();
    if !failed.is_empty() {
        return Err(DumpError::Incomplete(format!(
            "{} volume(s) not fully applied: {}",
            failed.len(),
            failed.join(", ")
        )));
    }
    info!(files = seen.len().saturating_sub(1), "restore finished");
    Ok(())
}

pub fn handle_ls(dir: PathBuf) -> Result<()> {
    for v in locate(&dir)? {
        println!("{v}");
    }
    Ok(())
}
