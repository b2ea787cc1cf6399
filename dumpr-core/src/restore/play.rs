use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::db::Database;
use crate::error::Result;

/// First statement of a volume that the database refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementFailure {
    /// 0-based position among the statements of the file.
    pub index: usize,
    pub message: String,
}

/// What playing one volume did. Statement failures land here rather than in
/// an `Err`; the caller decides whether to stop the restore.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayOutcome {
    pub statements: usize,
    pub executed: usize,
    pub failure: Option<StatementFailure>,
}

impl PlayOutcome {
    /// Every statement of the file went through.
    pub fn applied(&self) -> bool {
        self.failure.is_none()
    }
}

/// Split a script on `;` followed by a line terminator. Whitespace-only
/// fragments are dropped; a last statement without a line terminator keeps
/// working.
pub fn split_statements(script: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    for (i, _) in script.match_indices(';') {
        let rest = &script[i + 1..];
        if rest.starts_with('\n') || rest.starts_with("\r\n") {
            out.push(&script[start..i]);
            start = i + 1;
        }
    }
    out.push(&script[start..]);
    out.into_iter()
        .map(|s| s.trim().trim_end_matches(';').trim_end())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Whether `text` holds a `;` + line terminator, which would split it in two
/// on playback.
pub fn contains_delimiter(text: &str) -> bool {
    text.contains(";\n") || text.contains(";\r\n")
}

pub struct ScriptPlayer<'a, D: Database + ?Sized> {
    db: &'a D,
}

impl<'a, D: Database + ?Sized> ScriptPlayer<'a, D> {
    pub fn new(db: &'a D) -> Self {
        Self { db }
    }

    /// Run every statement of the volume at `path` in order, stopping at the
    /// first one that fails. Only reading the file can return `Err`.
    pub fn play(&self, path: &Path) -> Result<PlayOutcome> {
        let script = fs::read_to_string(path)?;
        Ok(self.play_script(&script, path))
    }

    fn play_script(&self, script: &str, path: &Path) -> PlayOutcome {
        let statements = split_statements(script);
        let mut outcome = PlayOutcome {
            statements: statements.len(),
            ..Default::default()
        };
        for (index, sql) in statements.iter().enumerate() {
            if let Err(e) = self.db.execute(sql) {
                warn!(file = %path.display(), index, error = %e, "statement failed");
                outcome.failure = Some(StatementFailure {
                    index,
                    message: e.to_string(),
                });
                break;
            }
            outcome.executed += 1;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_sqlite::SqliteDatabase;

    #[test]
    fn splits_on_semicolon_newline_only() {
        let script = "DROP TABLE IF EXISTS \"t\";\nCREATE TABLE t (a TEXT);\r\n\n\
                      INSERT INTO t VALUES ('x;y'),('z');\n   \n";
        assert_eq!(
            split_statements(script),
            [
                "DROP TABLE IF EXISTS \"t\"",
                "CREATE TABLE t (a TEXT)",
                "INSERT INTO t VALUES ('x;y'),('z')"
            ]
        );
    }

    #[test]
    fn last_statement_may_lack_terminator() {
        assert_eq!(split_statements("SELECT 1;\nSELECT 2;"), ["SELECT 1", "SELECT 2"]);
        assert!(split_statements(" \n\n").is_empty());
    }

    #[test]
    fn detects_delimiters_with_either_line_ending() {
        assert!(contains_delimiter("a;\nb"));
        assert!(contains_delimiter("a;\r\nb"));
        assert!(!contains_delimiter("a; b\n"));
        assert!(!contains_delimiter("a;"));
    }

    #[test]
    fn plays_a_volume() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t#0.sql");
        fs::write(
            &path,
            "DROP TABLE IF EXISTS \"t\";\nCREATE TABLE t (a INTEGER);\n\nINSERT INTO \"t\" VALUES (1),(2);\n",
        )
        .unwrap();
        let db = SqliteDatabase::open_in_memory().unwrap();

        let outcome = ScriptPlayer::new(&db).play(&path).unwrap();
        assert!(outcome.applied());
        assert_eq!((outcome.statements, outcome.executed), (3, 3));
        assert_eq!(db.count_rows("t").unwrap(), 2);
    }

    #[test]
    fn failing_statement_is_reported_not_raised() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("t#0.sql");
        fs::write(
            &path,
            "CREATE TABLE t (a INTEGER);\nINSERT INTO nope VALUES (1);\nINSERT INTO t VALUES (1);\n",
        )
        .unwrap();
        let db = SqliteDatabase::open_in_memory().unwrap();

        let outcome = ScriptPlayer::new(&db).play(&path).unwrap();
        assert!(!outcome.applied());
        assert_eq!(outcome.executed, 1);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.index, 1);
        assert!(failure.message.contains("nope"));
        // stopped at the failure
        assert_eq!(db.count_rows("t").unwrap(), 0);
    }

    #[test]
    fn unreadable_file_is_an_error() {
        let tmp = tempfile::tempdir().unwrap();
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(ScriptPlayer::new(&db).play(&tmp.path().join("x#0.sql")).is_err());
    }
}
