use thiserror::Error;

#[derive(Error, Debug)]
pub enum DumpError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Malformed volume name: {0}")]
    MalformedVolume(String),

    #[error("Format error: {0}")]
    Format(String),

    #[error("Incomplete: {0}")]
    Incomplete(String),
}

// Convenient crate-wide result type
pub type Result<T> = std::result::Result<T, DumpError>;
