#![forbid(unsafe_code)]

pub mod error;
pub mod options;

pub mod domain;
pub mod registry;

pub mod db;
pub mod db_factory;
pub mod db_sqlite;

pub mod backup {
    pub mod engine;
    pub mod rows;
    pub mod schema;
    pub mod volume;
}

pub mod restore {
    pub mod engine;
    pub mod locate;
    pub mod play;
}

// Re-exports: stable API surface
pub use backup::engine::BackupEngine;
pub use db::{Database, Row, Value};
pub use domain::{
    BackupCursor, BackupProgress, RecoveryCursor, RecoveryProgress, TableSpec, VolumeName,
};
pub use options::BackupOptions;
pub use restore::engine::RecoveryEngine;
pub use restore::play::PlayOutcome;
