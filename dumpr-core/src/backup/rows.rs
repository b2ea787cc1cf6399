use crate::db::{Database, Row};
use crate::error::Result;

/// Pulls one bounded window of rows and renders it as a single statement.
pub struct RowBatchReader<'a, D: Database + ?Sized> {
    db: &'a D,
}

impl<'a, D: Database + ?Sized> RowBatchReader<'a, D> {
    pub fn new(db: &'a D) -> Self {
        Self { db }
    }

    pub fn count(&self, table: &str) -> Result<u64> {
        self.db.count_rows(table)
    }

    pub fn fetch(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        self.db.fetch_rows(table, offset, limit)
    }

    /// `INSERT INTO t VALUES (..),(..);` followed by a newline. `None` for an
    /// empty batch.
    pub fn render_insert(&self, table: &str, rows: &[Row]) -> Option<String> {
        if rows.is_empty() {
            return None;
        }
        let mut sql = format!("INSERT INTO {} VALUES ", self.db.quote_ident(table));
        for (i, row) in rows.iter().enumerate() {
            if i > 0 {
                sql.push(',');
            }
            sql.push('(');
            for (j, v) in row.iter().enumerate() {
                if j > 0 {
                    sql.push(',');
                }
                sql.push_str(&self.db.quote_value(v));
            }
            sql.push(')');
        }
        sql.push_str(";\n");
        Some(sql)
    }
}
