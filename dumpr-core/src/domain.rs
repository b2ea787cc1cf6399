// dumpr_core/src/domain.rs
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{DumpError, Result};
use crate::restore::play::PlayOutcome;

/// Extension carried by every volume file.
pub const VOLUME_EXT: &str = "sql";

/// One table to back up. Duplicates are allowed and simply re-emit the table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TableSpec(String);

impl TableSpec {
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(DumpError::Config("table name must not be empty".into()));
        }
        Ok(Self(name))
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for TableSpec {
    type Error = DumpError;
    fn try_from(s: String) -> Result<Self> {
        Self::new(s)
    }
}

impl From<TableSpec> for String {
    fn from(t: TableSpec) -> Self {
        t.0
    }
}

impl fmt::Display for TableSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// `<table>#<index>.sql`, kept structured and packed only at the filesystem
/// and resume-token boundary.
///
/// Ordering is by table name, then numerically by index, which is exactly
/// the restore order.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct VolumeName {
    pub table: String,
    pub index: u32,
}

impl VolumeName {
    pub fn first(table: &str) -> Self {
        Self {
            table: table.to_string(),
            index: 0,
        }
    }

    pub fn next(&self) -> Self {
        Self {
            table: self.table.clone(),
            index: self.index + 1,
        }
    }

    pub fn file_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for VolumeName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}.{}", self.table, self.index, VOLUME_EXT)
    }
}

impl FromStr for VolumeName {
    type Err = DumpError;

    fn from_str(s: &str) -> Result<Self> {
        let malformed = || DumpError::MalformedVolume(s.to_string());
        let (table, rest) = s.rsplit_once('#').ok_or_else(malformed)?;
        let (index, ext) = rest.split_once('.').ok_or_else(malformed)?;
        if table.is_empty() || ext != VOLUME_EXT {
            return Err(malformed());
        }
        let index = index.parse::<u32>().map_err(|_| malformed())?;
        Ok(Self {
            table: table.to_string(),
            index,
        })
    }
}

impl TryFrom<String> for VolumeName {
    type Error = DumpError;
    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<VolumeName> for String {
    fn from(v: VolumeName) -> Self {
        v.to_string()
    }
}

/// Resume state of a backup. `BackupCursor::default()` starts a fresh run.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupCursor {
    pub table_index: usize,
    pub rows_emitted: u64,
    pub rows_total: u64,
    pub table_percentage: u8,
    /// Schema preamble of the active table is on disk.
    pub schema_emitted: bool,
    pub volume: Option<VolumeName>,
    /// Length of `volume` after the last completed tick.
    pub volume_bytes: u64,
    pub dir: Option<PathBuf>,
}

/// What one backup tick reports back to the driver.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupProgress {
    pub table: Option<String>,
    pub table_index: usize,
    pub rows_emitted: u64,
    pub rows_total: u64,
    pub percentage: u8,
    pub table_percentage: u8,
    pub file: Option<String>,
}

impl BackupProgress {
    pub fn is_done(&self) -> bool {
        self.percentage >= 100
    }
}

/// Resume state of a restore. `next_index` is the file the next tick plays.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryCursor {
    pub current_index: usize,
    pub next_index: usize,
    pub percentage: u8,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecoveryProgress {
    pub current_index: usize,
    pub next_index: usize,
    pub percentage: u8,
    /// Volume played by this tick; `None` once the listing is exhausted.
    pub file: Option<String>,
    pub outcome: Option<PlayOutcome>,
}

impl RecoveryProgress {
    pub fn is_done(&self) -> bool {
        self.percentage >= 100
    }

    /// True when this tick played a file and some statement in it failed.
    pub fn failed(&self) -> bool {
        self.outcome.as_ref().is_some_and(|o| !o.applied())
    }
}

macro_rules! json_token {
    ($ty:ty) => {
        impl $ty {
            /// Decode a resume token; an empty string is a fresh start.
            pub fn from_token(token: &str) -> Result<Self> {
                if token.trim().is_empty() {
                    return Ok(Self::default());
                }
                serde_json::from_str(token)
                    .map_err(|e| DumpError::Format(format!("resume token: {e}")))
            }

            pub fn to_token(&self) -> Result<String> {
                serde_json::to_string(self)
                    .map_err(|e| DumpError::Format(format!("resume token: {e}")))
            }
        }
    };
}

json_token!(BackupCursor);
json_token!(RecoveryCursor);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn volume_name_round_trips_through_file_name() {
        let v: VolumeName = "orders#12.sql".parse().unwrap();
        assert_eq!(v.table, "orders");
        assert_eq!(v.index, 12);
        assert_eq!(v.file_name(), "orders#12.sql");
        assert_eq!(v.next().file_name(), "orders#13.sql");
    }

    #[test]
    fn volume_name_rejects_malformed_names() {
        for bad in ["orders.sql", "orders#1", "#1.sql", "orders#x.sql", "orders#1.txt"] {
            assert!(
                matches!(bad.parse::<VolumeName>(), Err(DumpError::MalformedVolume(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn volume_names_sort_by_table_then_numeric_index() {
        let mut v: Vec<VolumeName> = ["b#1.sql", "a#10.sql", "a#2.sql", "b#0.sql"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();
        v.sort();
        let names: Vec<String> = v.iter().map(VolumeName::file_name).collect();
        assert_eq!(names, ["a#2.sql", "a#10.sql", "b#0.sql", "b#1.sql"]);
    }

    #[test]
    fn empty_table_name_is_a_config_error() {
        assert!(matches!(TableSpec::new(""), Err(DumpError::Config(_))));
        assert!(serde_json::from_str::<TableSpec>("\"\"").is_err());
    }

    #[test]
    fn empty_tokens_start_fresh() {
        assert_eq!(BackupCursor::from_token("").unwrap(), BackupCursor::default());
        assert_eq!(RecoveryCursor::from_token("{}").unwrap(), RecoveryCursor::default());
    }

    #[test]
    fn backup_cursor_token_keeps_packed_volume_name() {
        let c = BackupCursor {
            table_index: 1,
            volume: Some(VolumeName {
                table: "t2".into(),
                index: 3,
            }),
            ..Default::default()
        };
        let token = c.to_token().unwrap();
        assert!(token.contains("\"t2#3.sql\""));
        assert_eq!(BackupCursor::from_token(&token).unwrap(), c);
    }

    #[test]
    fn garbage_token_is_a_format_error() {
        assert!(matches!(
            BackupCursor::from_token("not json"),
            Err(DumpError::Format(_))
        ));
    }
}
