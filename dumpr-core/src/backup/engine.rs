use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::backup::rows::RowBatchReader;
use crate::backup::schema::SchemaEmitter;
use crate::backup::volume::VolumeWriter;
use crate::db::Database;
use crate::domain::{BackupCursor, BackupProgress, TableSpec, VolumeName};
use crate::error::{DumpError, Result};
use crate::options::BackupOptions;

/// Single-step backup state machine. Every call to [`BackupEngine::step`]
/// does one bounded unit of work: the schema preamble of a table, or one
/// batch of its rows.
pub struct BackupEngine<D: Database> {
    db: D,
    options: BackupOptions,
    tables: Option<Vec<TableSpec>>,
}

impl<D: Database> BackupEngine<D> {
    pub fn new(db: D, options: BackupOptions) -> Result<Self> {
        options.validate()?;
        let tables = options.tables.clone();
        Ok(Self {
            db,
            options,
            tables,
        })
    }

    pub fn options(&self) -> &BackupOptions {
        &self.options
    }

    /// The ordered table list, resolved from the database listing on first
    /// use unless an explicit order was configured.
    pub fn tables(&mut self) -> Result<&[TableSpec]> {
        if self.tables.is_none() {
            let listed = self
                .db
                .list_tables()?
                .into_iter()
                .map(TableSpec::new)
                .collect::<Result<Vec<_>>>()?;
            debug!(count = listed.len(), "resolved table list");
            self.tables = Some(listed);
        }
        Ok(self.tables.as_deref().unwrap_or_default())
    }

    /// Advance the backup by one tick. `cursor` is never modified; on error
    /// the caller may retry with the same cursor.
    pub fn step(&mut self, cursor: &BackupCursor) -> Result<(BackupCursor, BackupProgress)> {
        let dir = self.resolve_dir(cursor)?;
        let tables = self.tables()?.to_vec();
        let count = tables.len();

        let mut next = cursor.clone();
        next.dir = Some(dir.clone());

        if next.table_percentage >= 100 && next.table_index + 1 < count {
            next.table_index += 1;
            next.rows_emitted = 0;
            next.rows_total = 0;
            next.table_percentage = 0;
            next.schema_emitted = false;
            next.volume = Some(VolumeName::first(tables[next.table_index].name()));
            next.volume_bytes = 0;
            info!(table = %tables[next.table_index], index = next.table_index, "next table");
        }

        let Some(table) = tables.get(next.table_index) else {
            debug!(index = next.table_index, count, "no table left to back up");
            let progress = progress_of(&next, None, 100);
            return Ok((next, progress));
        };

        let volume = match &next.volume {
            Some(v) => v.clone(),
            None => {
                next.volume_bytes = 0;
                VolumeName::first(table.name())
            }
        };
        let writer = VolumeWriter::open(&dir, self.options.volume_size_bytes())?;

        if !next.schema_emitted {
            let preamble = SchemaEmitter::new(&self.db).emit(table.name())?;
            let total = if self.options.skips_rows_of(table.name()) {
                0
            } else {
                RowBatchReader::new(&self.db).count(table.name())?
            };
            writer.rewind(&volume, next.volume_bytes)?;
            writer.discard_after(&volume)?;
            next.volume_bytes = writer.append(&volume, &preamble)?;
            next.volume = Some(volume);
            next.rows_total = total;
            next.schema_emitted = true;
            debug!(table = %table, total, "schema emitted");
        } else if next.rows_emitted < next.rows_total {
            let limit = self.options.batch_rows;
            let reader = RowBatchReader::new(&self.db);
            let rows = reader.fetch(table.name(), next.rows_emitted, limit)?;
            let expected = limit.min(next.rows_total - next.rows_emitted);
            if (rows.len() as u64) < expected {
                // rows deleted since the count was taken
                warn!(
                    table = %table,
                    offset = next.rows_emitted,
                    expected,
                    got = rows.len(),
                    "row batch came back short"
                );
            }
            match reader.render_insert(table.name(), &rows) {
                Some(insert) => {
                    writer.rewind(&volume, next.volume_bytes)?;
                    let target = writer.check_rollover(&volume)?;
                    if target != volume {
                        next.volume_bytes = 0;
                        writer.rewind(&target, 0)?;
                    }
                    next.volume_bytes = writer.append(&target, &insert)?;
                    next.volume = Some(target);
                }
                None => next.volume = Some(volume),
            }
            next.rows_emitted = next.rows_emitted.saturating_add(limit).min(next.rows_total);
            debug!(table = %table, emitted = next.rows_emitted, total = next.rows_total, "rows emitted");
        } else {
            next.volume = Some(volume);
        }

        next.table_percentage = table_percentage(next.rows_emitted, next.rows_total);
        let overall = overall_percentage(next.table_index, count, next.table_percentage);
        let progress = progress_of(&next, Some(table), overall);
        Ok((next, progress))
    }

    fn resolve_dir(&self, cursor: &BackupCursor) -> Result<PathBuf> {
        cursor
            .dir
            .clone()
            .or_else(|| self.options.dir.clone())
            .filter(|d| !d.as_os_str().is_empty())
            .ok_or_else(|| DumpError::Config("backup directory not set".into()))
    }
}

fn table_percentage(emitted: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    (u128::from(emitted) * 100 / u128::from(total)).min(100) as u8
}

fn overall_percentage(index: usize, count: usize, table_pct: u8) -> u8 {
    if count == 0 {
        return 100;
    }
    let done = if table_pct >= 100 { index + 1 } else { index };
    (done * 100 / count).min(100) as u8
}

fn progress_of(c: &BackupCursor, table: Option<&TableSpec>, percentage: u8) -> BackupProgress {
    BackupProgress {
        table: table.map(|t| t.name().to_string()),
        table_index: c.table_index,
        rows_emitted: c.rows_emitted,
        rows_total: c.rows_total,
        percentage,
        table_percentage: c.table_percentage,
        file: c.volume.as_ref().map(VolumeName::file_name),
    }
}
