use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::domain::TableSpec;
use crate::error::{DumpError, Result};

pub const DEFAULT_VOLUME_SIZE_MB: u64 = 2;
pub const DEFAULT_BATCH_ROWS: u64 = 200;

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BackupOptions {
    /// Destination directory. May instead come from a resumed cursor.
    pub dir: Option<PathBuf>,
    /// Roll over to the next volume once the active one reaches this size.
    pub volume_size_mb: u64,
    /// Rows fetched and rendered per tick.
    pub batch_rows: u64,
    /// Emit schema only, for every table.
    pub only_structure: bool,
    /// Tables whose rows are skipped.
    pub structure_only: BTreeSet<String>,
    /// Explicit table order; `None` uses the database listing order.
    pub tables: Option<Vec<TableSpec>>,
}

impl Default for BackupOptions {
    fn default() -> Self {
        Self {
            dir: None,
            volume_size_mb: DEFAULT_VOLUME_SIZE_MB,
            batch_rows: DEFAULT_BATCH_ROWS,
            only_structure: false,
            structure_only: BTreeSet::new(),
            tables: None,
        }
    }
}

impl BackupOptions {
    pub fn with_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.dir = Some(dir.into());
        self
    }

    pub fn with_tables<I, S>(mut self, tables: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let tables = tables
            .into_iter()
            .map(TableSpec::new)
            .collect::<Result<Vec<_>>>()?;
        self.tables = Some(tables);
        Ok(self)
    }

    pub fn volume_size_bytes(&self) -> u64 {
        self.volume_size_mb.saturating_mul(1024 * 1024)
    }

    pub fn skips_rows_of(&self, table: &str) -> bool {
        self.only_structure || self.structure_only.contains(table)
    }

    pub fn validate(&self) -> Result<()> {
        if self.volume_size_mb == 0 {
            return Err(DumpError::Config("volume size must be at least 1 MB".into()));
        }
        if self.batch_rows == 0 {
            return Err(DumpError::Config("batch size must be at least 1 row".into()));
        }
        if self.structure_only.iter().any(String::is_empty) {
            return Err(DumpError::Config("table name must not be empty".into()));
        }
        Ok(())
    }
}
