//! Plain text extractor.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use super::{ExtractError, Extractor};

/// Reads textual files directly, up to a byte cap.
///
/// Content past `max_bytes` is dropped. Bytes that are not valid UTF-8 are
/// replaced rather than rejected, so a truncated multi-byte sequence at the
/// cap never fails the read.
pub struct PlainTextExtractor {
    extensions: Vec<String>,
    max_bytes: u64,
}

impl PlainTextExtractor {
    pub fn new(extensions: Vec<String>, max_bytes: u64) -> Self {
        Self {
            extensions: extensions.into_iter().map(|e| e.to_lowercase()).collect(),
            max_bytes,
        }
    }

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }
}

impl Extractor for PlainTextExtractor {
    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let file = File::open(path).map_err(|e| ExtractError::read(path, e))?;

        let mut bytes = Vec::new();
        file.take(self.max_bytes)
            .read_to_end(&mut bytes)
            .map_err(|e| ExtractError::read(path, e))?;

        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    fn supported_extensions(&self) -> Vec<String> {
        self.extensions.clone()
    }
}
