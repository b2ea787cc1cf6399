use std::path::PathBuf;

use crate::db::Database;
use crate::db_sqlite::SqliteDatabase;
use crate::error::Result;
use crate::registry::ConnectionId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Backend {
    Sqlite,
}

impl Backend {
    pub fn name(&self) -> &'static str {
        match self {
            Backend::Sqlite => "sqlite",
        }
    }
}

#[derive(Clone, Debug)]
pub struct OpenParams {
    pub path: PathBuf,
}

impl OpenParams {
    pub fn connection_id(&self, backend: Backend) -> ConnectionId {
        ConnectionId::new(backend.name(), self.path.to_string_lossy())
    }
}

pub fn open_database(backend: Backend, p: &OpenParams) -> Result<Box<dyn Database>> {
    match backend {
        Backend::Sqlite => Ok(Box::new(SqliteDatabase::open(&p.path)?)),
    }
}
