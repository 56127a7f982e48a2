use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during text extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    /// No extractor handles this extension. Expected for binary files.
    #[error("Unsupported file type: {extension:?}")]
    UnsupportedType { extension: String },

    /// The file has a supported type but could not be read.
    #[error("Failed to read {}: {source}", path.display())]
    ReadFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ExtractError {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ExtractError::ReadFailure {
            path: path.into(),
            source,
        }
    }

    /// Whether this outcome should be surfaced rather than silently skipped.
    pub fn is_fault(&self) -> bool {
        matches!(self, ExtractError::ReadFailure { .. })
    }
}
