use thiserror::Error;

/// Errors that can occur in the catalog store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A file record already exists for this path.
    #[error("File already indexed: {0}")]
    DuplicatePath(String),

    /// A directory entry already exists for this location.
    #[error("Directory already registered: {0}")]
    DuplicateDirectory(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Schema version {found} is newer than supported {supported}")]
    VersionTooNew { found: i32, supported: i32 },
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}
