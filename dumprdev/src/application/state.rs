use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use dumpr_core::error::Result;
use dumpr_core::{BackupCursor, RecoveryCursor};

pub const BACKUP_STATE: &str = ".dumpr-backup.json";
pub const RESTORE_STATE: &str = ".dumpr-restore.json";

pub fn state_path(explicit: Option<PathBuf>, dir: &Path, default_name: &str) -> PathBuf {
    explicit.unwrap_or_else(|| dir.join(default_name))
}

/// Token text saved at `path`; a missing file means a fresh start.
fn read_token(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(s) => Ok(s),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) => Err(e.into()),
    }
}

fn write_token(path: &Path, token: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    // an interrupted save leaves the previous token in place
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, token)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

pub fn load_backup(path: &Path) -> Result<BackupCursor> {
    BackupCursor::from_token(&read_token(path)?)
}

pub fn save_backup(path: &Path, cursor: &BackupCursor) -> Result<()> {
    write_token(path, &cursor.to_token()?)
}

pub fn load_restore(path: &Path) -> Result<RecoveryCursor> {
    RecoveryCursor::from_token(&read_token(path)?)
}

pub fn save_restore(path: &Path, cursor: &RecoveryCursor) -> Result<()> {
    write_token(path, &cursor.to_token()?)
}
