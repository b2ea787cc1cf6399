// dumpr_core/src/db.rs
use crate::error::Result;

/// A single column value as handed out by the driver.
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

pub type Row = Vec<Value>;

/// Driver-level handle the engines run against. The engines never open or
/// close it; every call blocks until the database answers.
pub trait Database {
    /// Table names in the order the database reports them.
    fn list_tables(&self) -> Result<Vec<String>>;

    /// Native creation statement for `table`, without a trailing `;`.
    fn create_statement(&self, table: &str) -> Result<String>;

    fn count_rows(&self, table: &str) -> Result<u64>;

    fn fetch_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>>;

    /// Render `value` as a literal that is safe to embed in a statement.
    fn quote_value(&self, value: &Value) -> String;

    fn quote_ident(&self, name: &str) -> String;

    /// Run one statement, discarding any result rows.
    fn execute(&self, sql: &str) -> Result<()>;
}

impl<T: Database + ?Sized> Database for &T {
    fn list_tables(&self) -> Result<Vec<String>> {
        (**self).list_tables()
    }
    fn create_statement(&self, table: &str) -> Result<String> {
        (**self).create_statement(table)
    }
    fn count_rows(&self, table: &str) -> Result<u64> {
        (**self).count_rows(table)
    }
    fn fetch_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        (**self).fetch_rows(table, offset, limit)
    }
    fn quote_value(&self, value: &Value) -> String {
        (**self).quote_value(value)
    }
    fn quote_ident(&self, name: &str) -> String {
        (**self).quote_ident(name)
    }
    fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }
}

impl<T: Database + ?Sized> Database for Box<T> {
    fn list_tables(&self) -> Result<Vec<String>> {
        (**self).list_tables()
    }
    fn create_statement(&self, table: &str) -> Result<String> {
        (**self).create_statement(table)
    }
    fn count_rows(&self, table: &str) -> Result<u64> {
        (**self).count_rows(table)
    }
    fn fetch_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        (**self).fetch_rows(table, offset, limit)
    }
    fn quote_value(&self, value: &Value) -> String {
        (**self).quote_value(value)
    }
    fn quote_ident(&self, name: &str) -> String {
        (**self).quote_ident(name)
    }
    fn execute(&self, sql: &str) -> Result<()> {
        (**self).execute(sql)
    }
}
