//! Filesystem metadata capture.

use chrono::{DateTime, Utc};
use std::fs::Metadata;
use std::path::{Path, PathBuf};

use crate::store::FileRecord;

/// True creation (birth) time, when the platform and filesystem report one.
pub fn birth_time(meta: &Metadata) -> Option<DateTime<Utc>> {
    meta.created().ok().map(DateTime::<Utc>::from)
}

/// Metadata of one walked file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileMetadata {
    pub path: PathBuf,
    pub name: String,
    /// Extension without the leading dot, as found on disk.
    pub extension: String,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl FileMetadata {
    /// Capture metadata from an already resolved filesystem entry.
    ///
    /// Creation time falls back to modification time where no birth time is
    /// available.
    pub fn capture(path: &Path, meta: &Metadata) -> Self {
        let modified_at = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());
        let created_at = birth_time(meta).unwrap_or(modified_at);

        Self {
            path: path.to_path_buf(),
            name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            extension: path
                .extension()
                .map(|e| e.to_string_lossy().into_owned())
                .unwrap_or_default(),
            size_bytes: meta.len(),
            created_at,
            modified_at,
        }
    }

    /// The catalog record for this file with the given content hash.
    pub fn to_record(&self, content_hash: impl Into<String>) -> FileRecord {
        FileRecord {
            id: None,
            path: self.path.to_string_lossy().into_owned(),
            name: self.name.clone(),
            extension: self.extension.clone(),
            created_at: self.created_at,
            modified_at: self.modified_at,
            size_bytes: self.size_bytes,
            content_hash: content_hash.into(),
        }
    }

    /// Header placed in front of extracted text in the keyword prompt.
    pub fn prompt_body(&self, text: &str) -> String {
        format!(
            "File: {}\nPath: {}\nSize: {} bytes\nCreated: {}\nModified: {}\nContent:\n{}",
            self.name,
            self.path.display(),
            self.size_bytes,
            self.created_at.to_rfc3339(),
            self.modified_at.to_rfc3339(),
            text
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_capture() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Report.MD");
        fs::write(&path, "hello world").unwrap();
        let meta = fs::metadata(&path).unwrap();

        let captured = FileMetadata::capture(&path, &meta);
        assert_eq!(captured.name, "Report.MD");
        assert_eq!(captured.extension, "MD");
        assert_eq!(captured.size_bytes, 11);
        if birth_time(&meta).is_none() {
            assert_eq!(captured.created_at, captured.modified_at);
        }
    }

    #[test]
    fn test_no_extension() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("Makefile");
        fs::write(&path, "all:").unwrap();
        let captured = FileMetadata::capture(&path, &fs::metadata(&path).unwrap());
        assert_eq!(captured.extension, "");
    }

    #[test]
    fn test_prompt_body_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "hello world").unwrap();
        let captured = FileMetadata::capture(&path, &fs::metadata(&path).unwrap());

        let body = captured.prompt_body("hello world");
        assert!(body.starts_with("File: a.txt\nPath: "));
        assert!(body.contains("Size: 11 bytes\n"));
        assert!(body.contains(&format!("Created: {}", captured.created_at.to_rfc3339())));
        assert!(body.ends_with("Content:\nhello world"));
    }
}
