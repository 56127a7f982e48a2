use std::path::PathBuf;
use thiserror::Error;

use crate::llm::LLMError;

/// Errors that abort a whole indexing run.
///
/// Per-file failures never surface here; they are reported as
/// [`super::FileOutcome`] values.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("Root path must not be empty")]
    EmptyRoot,

    #[error("Root path does not exist: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Root path is not a directory: {}", .0.display())]
    RootNotDirectory(PathBuf),

    #[error("Cannot read root path {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Keyword service configuration error: {0}")]
    Service(#[from] LLMError),
}
