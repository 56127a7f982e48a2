//! Per-file indexing pipeline.

use std::collections::HashSet;
use std::fmt::Display;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tracing::{debug, warn};

use super::cancel::CancelToken;
use super::metadata::FileMetadata;
use super::report::{FileOutcome, ProcessedFile};
use crate::config::{IndexerConfig, ReindexPolicy, HASH_SENTINEL};
use crate::extract::{ExtractError, ExtractorRegistry};
use crate::hash::{ContentHasher, Sha256Hasher};
use crate::keywords::{normalize_keyword, KeywordExtractor};
use crate::llm::LLMError;
use crate::store::{CatalogStore, KeywordRecord, StoreError};

/// A keyword batch write failed after `stored` rows had been written.
struct KeywordWriteError {
    stored: usize,
    error: StoreError,
}

/// Runs the pipeline for a single file.
///
/// Stages run strictly in order: metadata, hash, record, extractability
/// check, extraction, keyword generation, keyword persistence. Each stage
/// failure is reported and either degraded (hash) or ends this file's
/// pipeline; it never affects other files.
///
/// Keyword generation is gated by a semaphore shared by every pipeline of a
/// run so the external service sees a bounded number of requests.
pub struct FileProcessor {
    store: Arc<dyn CatalogStore>,
    keywords: Arc<dyn KeywordExtractor>,
    extractors: Arc<ExtractorRegistry>,
    hasher: Arc<dyn ContentHasher>,
    request_gate: Arc<Semaphore>,
    batch_size: usize,
    reindex: ReindexPolicy,
    verbose: bool,
}

impl FileProcessor {
    /// Create a processor from the `[indexer]` config section.
    pub fn new(
        store: Arc<dyn CatalogStore>,
        keywords: Arc<dyn KeywordExtractor>,
        config: &IndexerConfig,
    ) -> Self {
        Self {
            store,
            keywords,
            extractors: Arc::new(ExtractorRegistry::from_config(config)),
            hasher: Arc::new(Sha256Hasher),
            request_gate: Arc::new(Semaphore::new(config.max_concurrent_requests.max(1))),
            batch_size: config.keyword_batch_size.max(1),
            reindex: config.reindex,
            verbose: config.verbose,
        }
    }

    /// Replace the extractor registry.
    pub fn with_extractors(mut self, extractors: Arc<ExtractorRegistry>) -> Self {
        self.extractors = extractors;
        self
    }

    /// Replace the content hasher.
    pub fn with_hasher(mut self, hasher: Arc<dyn ContentHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn verbose(&self) -> bool {
        self.verbose
    }

    /// Number of keyword requests that may start right now.
    pub fn available_request_permits(&self) -> usize {
        self.request_gate.available_permits()
    }

    fn report(&self, path: &Path, stage: &str, error: &dyn Display) {
        if self.verbose {
            warn!(path = %path.display(), stage, error = %error, "file stage failed");
        } else {
            debug!(path = %path.display(), stage, error = %error, "file stage failed");
        }
    }

    /// Process one file already resolved by the walker.
    pub async fn process(&self, path: PathBuf, meta: Metadata, cancel: &CancelToken) -> ProcessedFile {
        let mut processed = ProcessedFile {
            path,
            hash_failed: false,
            keywords_attempted: false,
            outcome: FileOutcome::Cancelled { file_id: None },
        };

        if cancel.is_cancelled() {
            return processed;
        }

        // 1. Metadata
        let file_meta = FileMetadata::capture(&processed.path, &meta);

        // 2. Hash, degrading to the sentinel
        let hash = match self.hash(&processed.path).await {
            Ok(hash) => hash,
            Err(e) => {
                self.report(&processed.path, "hash", &e);
                processed.hash_failed = true;
                HASH_SENTINEL.to_string()
            }
        };

        if cancel.is_cancelled() {
            return processed;
        }

        // 3. File record
        let file_id = match self.persist_record(&file_meta, hash).await {
            Ok(id) => id,
            Err(e) => {
                self.report(&processed.path, "record", &e);
                processed.outcome = FileOutcome::StoreFailed;
                return processed;
            }
        };

        if cancel.is_cancelled() {
            processed.outcome = FileOutcome::Cancelled { file_id: Some(file_id) };
            return processed;
        }

        // 4. Extractability
        if !self.extractors.can_extract(&processed.path) {
            processed.outcome = FileOutcome::MetadataOnly { file_id };
            return processed;
        }

        // 5. Extraction
        let text = match self.extract(&processed.path).await {
            Ok(text) => text,
            Err(ExtractError::UnsupportedType { .. }) => {
                processed.outcome = FileOutcome::MetadataOnly { file_id };
                return processed;
            }
            Err(e) => {
                self.report(&processed.path, "extract", &e);
                processed.outcome = FileOutcome::ExtractionFailed { file_id };
                return processed;
            }
        };

        // 6-7. Enriched prompt body and keyword generation
        let body = file_meta.prompt_body(&text);
        processed.keywords_attempted = true;
        let keywords = match self.generate(&body, cancel).await {
            Ok(keywords) => keywords,
            Err(LLMError::Cancelled) => {
                processed.outcome = FileOutcome::Cancelled { file_id: Some(file_id) };
                return processed;
            }
            Err(e) => {
                self.report(&processed.path, "keywords", &e);
                processed.outcome = FileOutcome::KeywordsFailed { file_id, stored: 0 };
                return processed;
            }
        };

        // 8. Keyword records
        processed.outcome = match self.persist_keywords(file_id, keywords).await {
            Ok(count) => {
                debug!(path = %processed.path.display(), keywords = count, "indexed file");
                FileOutcome::Indexed { file_id, keywords: count }
            }
            Err(e) => {
                self.report(&processed.path, "keyword records", &e.error);
                FileOutcome::KeywordsFailed { file_id, stored: e.stored }
            }
        };

        processed
    }

    async fn hash(&self, path: &Path) -> Result<String, String> {
        let hasher = Arc::clone(&self.hasher);
        let path = path.to_path_buf();
        tokio::task::spawn_blocking(move || hasher.hash_file(&path))
            .await
            .map_err(|e| format!("hash task failed: {e}"))?
            .map_err(|e| e.to_string())
    }

    async fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let extractors = Arc::clone(&self.extractors);
        let owned = path.to_path_buf();
        match tokio::task::spawn_blocking(move || extractors.extract_text(&owned)).await {
            Ok(result) => result,
            Err(e) => Err(ExtractError::read(
                path,
                std::io::Error::new(std::io::ErrorKind::Other, e.to_string()),
            )),
        }
    }

    /// Persist the file record under the configured re-index policy.
    async fn persist_record(&self, meta: &FileMetadata, hash: String) -> Result<i64, StoreError> {
        let record = meta.to_record(hash);
        let reindex = self.reindex;

        self.blocking(move |store| match reindex {
            ReindexPolicy::Replace => store.replace_file(&record),
            ReindexPolicy::Reject => store.create_file(&record),
        })
        .await
    }

    /// Wait for a request slot, then generate. Cancellation interrupts both
    /// the wait and an in-flight request, including its backoff sleeps.
    async fn generate(&self, body: &str, cancel: &CancelToken) -> Result<Vec<String>, LLMError> {
        let _permit = tokio::select! {
            permit = self.request_gate.acquire() => {
                permit.map_err(|_| LLMError::Cancelled)?
            }
            _ = cancel.cancelled() => return Err(LLMError::Cancelled),
        };

        tokio::select! {
            result = self.keywords.extract_keywords(body) => result,
            _ = cancel.cancelled() => Err(LLMError::Cancelled),
        }
    }

    /// Normalize, de-duplicate and store keywords in batches. Returns the count stored.
    ///
    /// Batches are written in order and each is atomic; on failure the error
    /// carries the rows already written by earlier batches.
    async fn persist_keywords(
        &self,
        file_id: i64,
        keywords: Vec<String>,
    ) -> Result<usize, KeywordWriteError> {
        let mut seen = HashSet::new();
        let records: Vec<KeywordRecord> = keywords
            .iter()
            .filter_map(|kw| normalize_keyword(kw))
            .filter(|kw| seen.insert(kw.clone()))
            .map(|kw| KeywordRecord::new(file_id, kw))
            .collect();

        let batch_size = self.batch_size;
        let store = Arc::clone(&self.store);

        tokio::task::spawn_blocking(move || {
            let mut stored = 0;
            for batch in records.chunks(batch_size) {
                store
                    .create_keywords(batch)
                    .map_err(|error| KeywordWriteError { stored, error })?;
                stored += batch.len();
            }
            Ok(stored)
        })
        .await
        .unwrap_or_else(|e| {
            Err(KeywordWriteError {
                stored: 0,
                error: StoreError::Database(format!("store task failed: {e}")),
            })
        })
    }

    /// Run a store operation off the async workers.
    async fn blocking<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&dyn CatalogStore) -> Result<T, StoreError> + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        tokio::task::spawn_blocking(move || op(store.as_ref()))
            .await
            .map_err(|e| StoreError::Database(format!("store task failed: {e}")))?
    }
}
