//! Catalog record types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Persisted metadata for one indexed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Store-assigned identifier. `None` until created.
    pub id: Option<i64>,
    /// Full path as walked. Unique in the catalog.
    pub path: String,
    /// File name.
    pub name: String,
    /// Extension without the leading dot, empty when absent.
    pub extension: String,
    /// Creation time, or modification time where the platform has none.
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
    pub size_bytes: u64,
    /// SHA-256 hex digest, or the hash sentinel when hashing failed.
    pub content_hash: String,
}

/// One normalized keyword owned by a file record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordRecord {
    pub file_id: i64,
    pub keyword: String,
}

impl KeywordRecord {
    pub fn new(file_id: i64, keyword: impl Into<String>) -> Self {
        Self {
            file_id,
            keyword: keyword.into(),
        }
    }
}

/// A directory registered for indexing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryEntry {
    pub id: Option<i64>,
    pub location: String,
    /// Blacklisted directories are skipped by callers before any walk.
    pub is_whitelisted: bool,
}

/// A keyword search hit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeywordMatch {
    pub file: FileRecord,
    pub keyword: String,
}

/// Whether `path` is `dir` itself or lies below it.
///
/// Unlike a raw string prefix test, `/data/a` does not contain `/data/ab/x`.
pub fn is_under(path: &str, dir: &str) -> bool {
    let dir = dir_prefix(dir);
    path == dir.trim_end_matches(std::path::MAIN_SEPARATOR) || path.starts_with(&dir)
}

/// `dir` with exactly one trailing separator.
pub(crate) fn dir_prefix(dir: &str) -> String {
    let trimmed = dir.trim_end_matches(std::path::MAIN_SEPARATOR);
    format!("{}{}", trimmed, std::path::MAIN_SEPARATOR)
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_is_under() {
        assert!(is_under("/data/a/file.txt", "/data/a"));
        assert!(is_under("/data/a/file.txt", "/data/a/"));
        assert!(is_under("/data/a", "/data/a"));
        assert!(!is_under("/data/ab/file.txt", "/data/a"));
        assert!(!is_under("/other/file.txt", "/data"));
    }
}
