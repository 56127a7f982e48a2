//! keydex core: a content-addressed file catalog with generated search keywords.

pub mod config;
pub mod extract;
pub mod hash;
pub mod indexer;
pub mod keywords;
pub mod llm;
pub mod store;

pub use config::{Config, ConfigError, IndexerConfig, LLMConfig, ReindexPolicy};
pub use extract::{ExtractError, ExtractorRegistry};
pub use hash::{hash_file, ContentHasher, HashError, Sha256Hasher};
pub use indexer::{
    index_directory, CancelToken, DirectoryWalker, FileOutcome, FileProcessor, IndexError,
    IndexReport,
};
pub use keywords::{KeywordClient, KeywordExtractor};
pub use llm::{Generator, LLMError, OllamaClient};
pub use store::{CatalogStore, FileRecord, MemoryStore, SqliteStore, StoreError};
