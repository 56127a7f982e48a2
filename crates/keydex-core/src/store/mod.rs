//! Catalog persistence.
//!
//! The indexing pipeline only needs two writes (create a file record, create a
//! batch of keyword records); everything else here serves the presentation
//! layer. Two implementations are provided:
//!
//! - [`SqliteStore`] - on-disk catalog with a unique path constraint and
//!   keywords cascade-deleted with their file
//! - [`MemoryStore`] - mutex-guarded maps with the same semantics, for tests

mod error;
mod memory;
mod models;
mod sqlite;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use models::{is_under, DirectoryEntry, FileRecord, KeywordMatch, KeywordRecord};
pub use sqlite::SqliteStore;

/// Trait for catalog storage backends.
///
/// Implementations must be safe to call from many file pipelines at once.
/// Every pipeline write is scoped to one file's data, so no cross-call
/// transaction is required.
pub trait CatalogStore: Send + Sync {
    /// Creates a file record and returns its id.
    ///
    /// Fails with [`StoreError::DuplicatePath`] when the path is already present.
    fn create_file(&self, record: &FileRecord) -> Result<i64, StoreError>;

    /// Replaces any record at `record.path` with `record` in one atomic step.
    ///
    /// The previous record's keywords go with it. On failure the previous
    /// record and its keywords are left untouched. Returns the new id.
    fn replace_file(&self, record: &FileRecord) -> Result<i64, StoreError>;

    /// Deletes the record for `path` together with its keywords.
    /// Returns whether a record existed.
    fn delete_file_by_path(&self, path: &str) -> Result<bool, StoreError>;

    /// Persists a batch of keyword records atomically.
    ///
    /// Every record must reference an existing file record.
    fn create_keywords(&self, batch: &[KeywordRecord]) -> Result<(), StoreError>;

    /// Looks up a file record by exact path.
    fn get_file_by_path(&self, path: &str) -> Result<Option<FileRecord>, StoreError>;

    /// Keywords of a file, in insertion order.
    fn keywords_for_file(&self, file_id: i64) -> Result<Vec<String>, StoreError>;

    /// Files whose name contains `query` (case-insensitive).
    fn search_files_by_name(&self, query: &str) -> Result<Vec<FileRecord>, StoreError>;

    /// Keywords starting with `prefix` (case-insensitive), with their files.
    fn search_keywords(&self, prefix: &str) -> Result<Vec<KeywordMatch>, StoreError>;

    /// Number of file records at or below `dir`.
    fn count_files_under(&self, dir: &str) -> Result<u64, StoreError>;

    /// Deletes every file record at or below `dir`. Returns the count removed.
    fn delete_files_under(&self, dir: &str) -> Result<u64, StoreError>;

    /// Registers a whitelisted directory.
    ///
    /// Fails with [`StoreError::DuplicateDirectory`] when already registered.
    fn add_directory(&self, location: &str) -> Result<DirectoryEntry, StoreError>;

    /// Looks up a directory entry.
    fn get_directory(&self, location: &str) -> Result<Option<DirectoryEntry>, StoreError>;

    /// Sets the whitelist flag, registering the directory when unknown.
    fn set_whitelisted(
        &self,
        location: &str,
        whitelisted: bool,
    ) -> Result<DirectoryEntry, StoreError>;

    /// Directories with the given whitelist flag, ordered by location.
    fn list_directories(&self, whitelisted: bool) -> Result<Vec<DirectoryEntry>, StoreError>;

    /// Removes a directory entry and every file record below it.
    /// Returns the number of file records removed.
    fn remove_directory(&self, location: &str) -> Result<u64, StoreError>;
}
