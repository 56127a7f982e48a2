//! Capability-based text extraction.
//!
//! Extraction is dispatched on file extension rather than on file type
//! detection: each [`Extractor`] advertises the extensions it handles and the
//! [`ExtractorRegistry`] routes a path to the matching one.
//!
//! # Example
//!
//! ```ignore
//! use keydex_core::extract::ExtractorRegistry;
//!
//! let registry = ExtractorRegistry::new();
//! if registry.can_extract(path) {
//!     let text = registry.extract_text(path)?;
//! }
//! ```

mod error;
mod plain;

pub use error::ExtractError;
pub use plain::PlainTextExtractor;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use crate::config::IndexerConfig;

/// Turns a file into text.
pub trait Extractor: Send + Sync {
    /// Read the file at `path` and return its text.
    fn extract(&self, path: &Path) -> Result<String, ExtractError>;

    /// Extensions this extractor handles (lower-case, no leading dot).
    fn supported_extensions(&self) -> Vec<String>;

    /// Check if this extractor can handle the given extension.
    fn can_extract(&self, extension: &str) -> bool {
        self.supported_extensions()
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension))
    }
}

/// Lower-cased extension of `path`, without the leading dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
}

/// Registry of extractors keyed by extension.
pub struct ExtractorRegistry {
    extractors: HashMap<String, Arc<dyn Extractor>>,
}

impl ExtractorRegistry {
    /// Create a registry with the built-in plain text extractor and defaults.
    pub fn new() -> Self {
        Self::from_config(&IndexerConfig::default())
    }

    /// Create a registry whose plain text extractor follows `config`.
    pub fn from_config(config: &IndexerConfig) -> Self {
        let mut registry = Self::empty();
        registry.register(Arc::new(PlainTextExtractor::new(
            config.extensions.clone(),
            config.max_extract_bytes,
        )));
        registry
    }

    /// Create a registry with no extractors.
    pub fn empty() -> Self {
        Self {
            extractors: HashMap::new(),
        }
    }

    /// Register an extractor for its supported extensions.
    pub fn register(&mut self, extractor: Arc<dyn Extractor>) {
        for ext in extractor.supported_extensions() {
            self.extractors.insert(ext.to_lowercase(), Arc::clone(&extractor));
        }
    }

    fn extractor_for(&self, path: &Path) -> Option<&Arc<dyn Extractor>> {
        extension_of(path).and_then(|ext| self.extractors.get(&ext))
    }

    /// Whether any extractor accepts this path. Pure function of the extension.
    pub fn can_extract(&self, path: &Path) -> bool {
        self.extractor_for(path).is_some()
    }

    /// Extract text from `path` with the extractor registered for its extension.
    pub fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        match self.extractor_for(path) {
            Some(extractor) => extractor.extract(path),
            None => Err(ExtractError::UnsupportedType {
                extension: extension_of(path).unwrap_or_default(),
            }),
        }
    }

    /// List all supported extensions.
    pub fn supported_extensions(&self) -> Vec<&str> {
        let mut exts: Vec<&str> = self.extractors.keys().map(|s| s.as_str()).collect();
        exts.sort_unstable();
        exts
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_can_extract_is_case_insensitive() {
        let registry = ExtractorRegistry::new();
        assert!(registry.can_extract(Path::new("notes.txt")));
        assert!(registry.can_extract(Path::new("NOTES.TXT")));
        assert!(registry.can_extract(Path::new("dir/Readme.Md")));
        assert!(!registry.can_extract(Path::new("image.png")));
        assert!(!registry.can_extract(Path::new("Makefile")));
    }

    #[test]
    fn test_unsupported_type_is_not_a_fault() {
        let registry = ExtractorRegistry::new();
        let err = registry.extract_text(Path::new("archive.bin")).unwrap_err();
        assert!(matches!(err, ExtractError::UnsupportedType { ref extension } if extension == "bin"));
        assert!(!err.is_fault());
    }

    #[test]
    fn test_every_allowed_extension_extracts() {
        let dir = TempDir::new().unwrap();
        let registry = ExtractorRegistry::new();

        for ext in registry.supported_extensions() {
            let path = dir.path().join(format!("sample.{ext}"));
            fs::write(&path, "content").unwrap();
            let text = registry.extract_text(&path);
            assert!(text.is_ok(), "extension {ext} failed: {text:?}");
        }
    }

    #[test]
    fn test_missing_file_is_read_failure() {
        let dir = TempDir::new().unwrap();
        let registry = ExtractorRegistry::new();
        let err = registry.extract_text(&dir.path().join("gone.txt")).unwrap_err();
        assert!(err.is_fault());
    }

    #[test]
    fn test_custom_extension_list() {
        let config = IndexerConfig {
            extensions: vec!["nfo".to_string()],
            ..Default::default()
        };
        let registry = ExtractorRegistry::from_config(&config);
        assert!(registry.can_extract(Path::new("release.NFO")));
        assert!(!registry.can_extract(Path::new("notes.txt")));
    }
}
