use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::db::Database;
use crate::domain::{RecoveryCursor, RecoveryProgress, VolumeName};
use crate::error::Result;
use crate::restore::locate::locate;
use crate::restore::play::ScriptPlayer;

/// Single-step restore state machine: each [`RecoveryEngine::step`] replays
/// exactly one volume from the source directory.
pub struct RecoveryEngine<D: Database> {
    db: D,
    source: PathBuf,
    volumes: Option<Vec<VolumeName>>,
}

impl<D: Database> RecoveryEngine<D> {
    pub fn new(db: D, source: impl Into<PathBuf>) -> Self {
        Self {
            db,
            source: source.into(),
            volumes: None,
        }
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    /// Ordered volume listing, scanned once per engine instance.
    pub fn volumes(&mut self) -> Result<&[VolumeName]> {
        if self.volumes.is_none() {
            let found = locate(&self.source)?;
            debug!(dir = %self.source.display(), count = found.len(), "located volumes");
            self.volumes = Some(found);
        }
        Ok(self.volumes.as_deref().unwrap_or_default())
    }

    /// Play the volume at `cursor.next_index`.
    ///
    /// The reported percentage counts the files finished *before* this one,
    /// so playing the last of `M` files reports `(M-1)*100/M`; 100 only
    /// comes from the following call, which finds nothing left to play.
    /// A volume whose statements fail still advances the cursor; the failure
    /// is in `progress.outcome`.
    pub fn step(&mut self, cursor: &RecoveryCursor) -> Result<(RecoveryCursor, RecoveryProgress)> {
        let volume = self.volumes()?.get(cursor.next_index).cloned();
        let total = self.volumes.as_ref().map_or(0, Vec::len);

        let mut next = cursor.clone();
        next.current_index = cursor.next_index;

        let Some(volume) = volume else {
            next.percentage = 100;
            info!(files = total, "restore complete");
            let progress = RecoveryProgress {
                current_index: next.current_index,
                next_index: next.next_index,
                percentage: next.percentage,
                file: None,
                outcome: None,
            };
            return Ok((next, progress));
        };

        let path = self.source.join(volume.file_name());
        let outcome = ScriptPlayer::new(&self.db).play(&path)?;
        if outcome.applied() {
            debug!(file = %volume, statements = outcome.executed, "volume applied");
        } else {
            warn!(file = %volume, "volume not fully applied, moving on");
        }

        next.percentage = (next.current_index * 100 / total) as u8;
        next.next_index = next.current_index + 1;
        let progress = RecoveryProgress {
            current_index: next.current_index,
            next_index: next.next_index,
            percentage: next.percentage,
            file: Some(volume.file_name()),
            outcome: Some(outcome),
        };
        Ok((next, progress))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_sqlite::SqliteDatabase;
    use std::fs;

    fn write(dir: &Path, name: &str, body: &str) {
        fs::write(dir.join(name), body).unwrap();
    }

    fn source() -> tempfile::TempDir {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "b#0.sql", "CREATE TABLE b (x INTEGER);\n");
        write(tmp.path(), "a#1.sql", "INSERT INTO a VALUES (2);\n");
        write(tmp.path(), "a#0.sql", "CREATE TABLE a (x INTEGER);\nINSERT INTO a VALUES (1);\n");
        write(tmp.path(), "b#1.sql", "INSERT INTO b VALUES (3);\n");
        tmp
    }

    #[test]
    fn plays_files_in_order_with_lagging_percentage() {
        let tmp = source();
        let db = SqliteDatabase::open_in_memory().unwrap();
        let mut engine = RecoveryEngine::new(&db, tmp.path());

        let mut cursor = RecoveryCursor::default();
        let mut files = Vec::new();
        let mut pcts = Vec::new();
        loop {
            let (next, p) = engine.step(&cursor).unwrap();
            cursor = next;
            pcts.push(p.percentage);
            if p.is_done() {
                assert!(p.file.is_none());
                assert_eq!((p.current_index, p.next_index), (4, 4));
                break;
            }
            assert!(!p.failed());
            files.push(p.file.unwrap());
        }
        assert_eq!(files, ["a#0.sql", "a#1.sql", "b#0.sql", "b#1.sql"]);
        assert_eq!(pcts, [0, 25, 50, 75, 100]);
        assert_eq!(db.count_rows("a").unwrap(), 2);
        assert_eq!(db.count_rows("b").unwrap(), 1);

        // further calls stay terminal
        let (again, p) = engine.step(&cursor).unwrap();
        assert_eq!(again, cursor);
        assert_eq!(p.percentage, 100);
    }

    #[test]
    fn failed_file_is_reported_and_skipped() {
        let tmp = tempfile::tempdir().unwrap();
        write(tmp.path(), "a#0.sql", "INSERT INTO missing VALUES (1);\n");
        write(tmp.path(), "b#0.sql", "CREATE TABLE b (x INTEGER);\n");
        let db = SqliteDatabase::open_in_memory().unwrap();
        let mut engine = RecoveryEngine::new(&db, tmp.path());

        let (c1, p1) = engine.step(&RecoveryCursor::default()).unwrap();
        assert!(p1.failed());
        assert_eq!(c1.next_index, 1);

        let (_, p2) = engine.step(&c1).unwrap();
        assert!(!p2.failed());
        assert_eq!(p2.file.as_deref(), Some("b#0.sql"));
        assert_eq!(db.count_rows("b").unwrap(), 0);
    }

    #[test]
    fn listing_is_cached_for_the_engine() {
        let tmp = source();
        let db = SqliteDatabase::open_in_memory().unwrap();
        let mut engine = RecoveryEngine::new(&db, tmp.path());
        let (c1, _) = engine.step(&RecoveryCursor::default()).unwrap();

        write(tmp.path(), "0#0.sql", "SELECT 1;\n");
        assert_eq!(engine.volumes().unwrap().len(), 4);
        let (_, p2) = engine.step(&c1).unwrap();
        assert_eq!(p2.file.as_deref(), Some("a#1.sql"));
    }

    #[test]
    fn empty_source_completes_on_first_call() {
        let tmp = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open_in_memory().unwrap();
        let mut engine = RecoveryEngine::new(&db, tmp.path());
        let (c, p) = engine.step(&RecoveryCursor::default()).unwrap();
        assert_eq!(p.percentage, 100);
        assert_eq!((c.current_index, c.next_index), (0, 0));
    }
}
