use std::path::Path;

use rusqlite::Connection;
use rusqlite::types::ValueRef;

use crate::db::{Database, Row, Value};
use crate::error::Result;

pub struct SqliteDatabase {
    conn: Connection,
}

impl SqliteDatabase {
    pub fn open(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: Connection::open(path)?,
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }
}

impl Database for SqliteDatabase {
    fn list_tables(&self) -> Result<Vec<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master \
             WHERE type = 'table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    fn create_statement(&self, table: &str) -> Result<String> {
        let sql = self.conn.query_row(
            "SELECT sql FROM sqlite_master WHERE type = 'table' AND name = ?1",
            [table],
            |row| row.get::<_, String>(0),
        )?;
        let sql = strip_comments(&sql);
        Ok(sql.trim_end().trim_end_matches(';').trim_end().to_string())
    }

    fn count_rows(&self, table: &str) -> Result<u64> {
        let sql = format!("SELECT COUNT(*) FROM {}", self.quote_ident(table));
        let n = self.conn.query_row(&sql, [], |row| row.get::<_, i64>(0))?;
        Ok(n.max(0) as u64)
    }

    fn fetch_rows(&self, table: &str, offset: u64, limit: u64) -> Result<Vec<Row>> {
        let sql = format!(
            "SELECT * FROM {} LIMIT ?1 OFFSET ?2",
            self.quote_ident(table)
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let width = stmt.column_count();
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let offset = i64::try_from(offset).unwrap_or(i64::MAX);
        let rows = stmt
            .query_map([limit, offset], |row| {
                (0..width)
                    .map(|i| row.get_ref(i).map(to_value))
                    .collect::<rusqlite::Result<Row>>()
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
    }

    fn quote_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "NULL".to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Real(f) => quote_real(*f),
            Value::Text(s) => quote_text(s),
            Value::Blob(b) => format!("X'{}'", hex::encode(b)),
        }
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn execute(&self, sql: &str) -> Result<()> {
        self.conn.execute_batch(sql)?;
        Ok(())
    }
}

fn to_value(v: ValueRef<'_>) -> Value {
    match v {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(i) => Value::Integer(i),
        ValueRef::Real(f) => Value::Real(f),
        ValueRef::Text(t) => Value::Text(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => Value::Blob(b.to_vec()),
    }
}

/// Drop `--` and `/* */` comments that sit outside quoted text. SQLite keeps
/// the creation text as typed, comments included.
fn strip_comments(sql: &str) -> String {
    let mut out = String::with_capacity(sql.len());
    let mut chars = sql.chars().peekable();
    let mut closing: Option<char> = None;
    while let Some(ch) = chars.next() {
        if let Some(q) = closing {
            out.push(ch);
            if ch == q {
                // a doubled quote closes and reopens on the next char
                closing = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => {
                closing = Some(ch);
                out.push(ch);
            }
            '[' => {
                closing = Some(']');
                out.push(ch);
            }
            '-' if chars.peek() == Some(&'-') => {
                while chars.next_if(|&c| c != '\n').is_some() {}
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for c in chars.by_ref() {
                    if prev == '*' && c == '/' {
                        break;
                    }
                    prev = c;
                }
                out.push(' ');
            }
            _ => out.push(ch),
        }
    }
    out
}

fn quote_real(f: f64) -> String {
    if f.is_nan() {
        // SQLite stores NaN as NULL
        "NULL".to_string()
    } else if f.is_infinite() {
        let lit = if f > 0.0 { "9e999" } else { "-9e999" };
        lit.to_string()
    } else {
        // Debug keeps the fraction ("1.0") so the value reads back as REAL
        format!("{f:?}")
    }
}

/// Single-quoted literal. CR and LF are spliced in with `char()` so a
/// rendered statement never holds a raw line break, and therefore never
/// the `;` + newline statement delimiter, inside a literal.
fn quote_text(s: &str) -> String {
    if !s.contains(['\n', '\r']) {
        return format!("'{}'", s.replace('\'', "''"));
    }
    let mut parts = Vec::new();
    let mut cur = String::new();
    for ch in s.chars() {
        let code = match ch {
            '\n' => 10,
            '\r' => 13,
            _ => {
                cur.push(ch);
                continue;
            }
        };
        if !cur.is_empty() {
            parts.push(format!("'{}'", cur.replace('\'', "''")));
            cur.clear();
        }
        parts.push(format!("char({code})"));
    }
    if !cur.is_empty() {
        parts.push(format!("'{}'", cur.replace('\'', "''")));
    }
    format!("({})", parts.join("||"))
}
