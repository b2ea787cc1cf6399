use crate::db::Database;
use crate::error::{DumpError, Result};
use crate::restore::play::contains_delimiter;

/// Produces the "drop + create" preamble that opens a table's first volume.
pub struct SchemaEmitter<'a, D: Database + ?Sized> {
    db: &'a D,
}

impl<'a, D: Database + ?Sized> SchemaEmitter<'a, D> {
    pub fn new(db: &'a D) -> Self {
        Self { db }
    }

    pub fn emit(&self, table: &str) -> Result<String> {
        let create = self.db.create_statement(table)?;
        if contains_delimiter(&create) {
            return Err(DumpError::Format(format!(
                "creation statement of {table} holds `;` before a line break and would not replay"
            )));
        }
        Ok(format!(
            "DROP TABLE IF EXISTS {};\n{};\n\n",
            self.db.quote_ident(table),
            create
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db_sqlite::SqliteDatabase;
    use crate::restore::play::split_statements;

    #[test]
    fn preamble_drops_then_creates() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute("CREATE TABLE t1 (id INTEGER, body TEXT)").unwrap();

        let sql = SchemaEmitter::new(&db).emit("t1").unwrap();
        assert_eq!(
            sql,
            "DROP TABLE IF EXISTS \"t1\";\nCREATE TABLE t1 (id INTEGER, body TEXT);\n\n"
        );
    }

    #[test]
    fn commented_schema_emits_a_single_statement() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (\n a INTEGER, -- id;\n b TEXT\n)").unwrap();

        let sql = SchemaEmitter::new(&db).emit("t").unwrap();
        assert_eq!(split_statements(&sql).len(), 2);
    }

    #[test]
    fn delimiter_inside_quoted_schema_text_is_rejected() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        db.execute("CREATE TABLE t (a TEXT DEFAULT 'x;\ny')").unwrap();

        let err = SchemaEmitter::new(&db).emit("t").unwrap_err();
        assert!(matches!(err, DumpError::Format(msg) if msg.contains("of t ")));
    }

    #[test]
    fn missing_table_propagates_the_database_error() {
        let db = SqliteDatabase::open_in_memory().unwrap();
        assert!(SchemaEmitter::new(&db).emit("nope").is_err());
    }
}
