//! Storage error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record: {0}")]
    Corrupt(String),
}

impl From<StorageError> for qprefs_admin::AdminError {
    fn from(err: StorageError) -> Self {
        qprefs_admin::AdminError::Backend(err.to_string())
    }
}
