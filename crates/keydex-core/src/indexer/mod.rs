//! Directory indexing pipeline.
//!
//! [`DirectoryWalker`] enumerates a tree and runs a [`FileProcessor`] for
//! every regular file. Each file goes through metadata capture, hashing,
//! record persistence, text extraction, keyword generation and keyword
//! persistence. A failure in one file never stops the others.

mod cancel;
mod error;
mod metadata;
mod processor;
mod report;
mod walker;

pub use cancel::CancelToken;
pub use error::IndexError;
pub use metadata::{birth_time, FileMetadata};
pub use processor::FileProcessor;
pub use report::{FileOutcome, IndexReport, ProcessedFile};
pub use walker::DirectoryWalker;

use std::path::Path;
use std::sync::Arc;

use crate::config::Config;
use crate::keywords::KeywordClient;
use crate::llm::OllamaClient;
use crate::store::CatalogStore;

/// Index `root` with the keyword service and limits described by `config`.
pub async fn index_directory(
    root: &Path,
    config: &Config,
    store: Arc<dyn CatalogStore>,
    cancel: CancelToken,
) -> Result<IndexReport, IndexError> {
    let generator = OllamaClient::from_config(&config.llm)?;
    let keywords = KeywordClient::from_config(generator, &config.llm);

    let processor = FileProcessor::new(store, Arc::new(keywords), &config.indexer);
    DirectoryWalker::new(Arc::new(processor), &config.indexer, cancel)
        .walk(root)
        .await
}
