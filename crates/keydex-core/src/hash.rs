//! Content hashing.
//!
//! Files are hashed with SHA-256 by streaming their bytes, so memory use does
//! not grow with file size.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors produced while hashing.
#[derive(Debug, Error)]
pub enum HashError {
    #[error("Failed to hash {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Computes content digests for files.
pub trait ContentHasher: Send + Sync {
    fn hash_file(&self, path: &Path) -> Result<String, HashError>;
}

/// Streaming SHA-256 hasher.
#[derive(Debug, Default, Clone, Copy)]
pub struct Sha256Hasher;

impl ContentHasher for Sha256Hasher {
    fn hash_file(&self, path: &Path) -> Result<String, HashError> {
        hash_file(path)
    }
}

/// Hash everything readable from `reader` and return the lower-case hex digest.
pub fn hash_reader<R: Read>(mut reader: R) -> io::Result<String> {
    let mut hasher = Sha256::new();
    io::copy(&mut reader, &mut hasher)?;
    Ok(hex::encode(hasher.finalize()))
}

/// Hash the contents of the file at `path`.
pub fn hash_file(path: &Path) -> Result<String, HashError> {
    let to_err = |source| HashError::Io {
        path: path.to_path_buf(),
        source,
    };

    let file = File::open(path).map_err(to_err)?;
    hash_reader(file).map_err(to_err)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_known_digest() {
        let digest = hash_reader(&b"hello world"[..]).unwrap();
        assert_eq!(
            digest,
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
    }

    #[test]
    fn test_empty_input() {
        let digest = hash_reader(&b""[..]).unwrap();
        assert_eq!(
            digest,
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn test_same_bytes_same_hash_regardless_of_name() {
        let dir = TempDir::new().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("nested-b.dat");
        fs::write(&a, b"same content").unwrap();
        fs::write(&b, b"same content").unwrap();

        assert_eq!(hash_file(&a).unwrap(), hash_file(&b).unwrap());
    }

    #[test]
    fn test_larger_than_buffer() {
        let data = vec![7u8; 64 * 1024 * 3 + 17];
        let streamed = hash_reader(&data[..]).unwrap();
        assert_eq!(streamed, hex::encode(Sha256::digest(&data)));
    }

    /// Yields `Interrupted` once before every chunk of the wrapped data.
    struct Interrupting<'a> {
        data: &'a [u8],
        interrupt: bool,
    }

    impl Read for Interrupting<'_> {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.interrupt = !self.interrupt;
            if self.interrupt {
                return Err(io::Error::new(io::ErrorKind::Interrupted, "signal"));
            }
            let n = buf.len().min(self.data.len()).min(5);
            buf[..n].copy_from_slice(&self.data[..n]);
            self.data = &self.data[n..];
            Ok(n)
        }
    }

    #[test]
    fn test_interrupted_reads_are_retried() {
        let reader = Interrupting {
            data: b"hello world",
            interrupt: false,
        };
        assert_eq!(hash_reader(reader).unwrap(), hash_reader(&b"hello world"[..]).unwrap());
    }

    #[test]
    fn test_read_error_propagates() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(io::ErrorKind::Other, "bad sector"))
            }
        }
        assert!(hash_reader(Broken).is_err());
    }

    #[test]
    fn test_hasher_trait_matches_free_function() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("x.bin");
        fs::write(&path, [0u8, 1, 2, 3]).unwrap();
        assert_eq!(Sha256Hasher.hash_file(&path).unwrap(), hash_file(&path).unwrap());
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let result = hash_file(&dir.path().join("missing"));
        assert!(matches!(result, Err(HashError::Io { .. })));
    }
}
