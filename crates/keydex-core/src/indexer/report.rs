//! Per-file outcomes and run summaries.

use std::path::PathBuf;
use std::time::Duration;

/// Terminal state of one file pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileOutcome {
    /// Record and keywords persisted.
    Indexed { file_id: i64, keywords: usize },
    /// Record persisted; the format is not extractable.
    MetadataOnly { file_id: i64 },
    /// Record persisted; reading the text failed.
    ExtractionFailed { file_id: i64 },
    /// Record persisted; keyword generation or keyword persistence failed.
    /// `stored` counts keyword rows written by batches that succeeded.
    KeywordsFailed { file_id: i64, stored: usize },
    /// The record could not be persisted; nothing else ran.
    StoreFailed,
    /// The run was cancelled before this pipeline finished. `file_id` is set
    /// when the record was persisted before cancellation was observed.
    Cancelled { file_id: Option<i64> },
}

impl FileOutcome {
    /// Id of the persisted file record, if any.
    pub fn file_id(&self) -> Option<i64> {
        match self {
            FileOutcome::Indexed { file_id, .. }
            | FileOutcome::MetadataOnly { file_id }
            | FileOutcome::ExtractionFailed { file_id }
            | FileOutcome::KeywordsFailed { file_id, .. } => Some(*file_id),
            FileOutcome::Cancelled { file_id } => *file_id,
            FileOutcome::StoreFailed => None,
        }
    }
}

/// Result of one file pipeline.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedFile {
    pub path: PathBuf,
    /// True when the content hash fell back to the sentinel.
    pub hash_failed: bool,
    /// Whether keyword generation was attempted.
    pub keywords_attempted: bool,
    pub outcome: FileOutcome,
}

/// Summary of an indexing run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IndexReport {
    /// Regular files handed to a pipeline.
    pub files_seen: usize,
    /// Files that ended with a persisted record.
    pub files_recorded: usize,
    pub metadata_only: usize,
    pub hash_failures: usize,
    pub extraction_failures: usize,
    pub keywords_attempted: usize,
    /// Files that gained at least one keyword.
    pub keywords_generated: usize,
    pub keyword_failures: usize,
    pub keyword_records: usize,
    pub store_failures: usize,
    /// Entries the traversal could not read.
    pub walk_errors: usize,
    /// Pipelines that panicked.
    pub task_failures: usize,
    pub cancelled: bool,
    pub elapsed: Duration,
}

impl IndexReport {
    /// Fold one file result into the summary.
    pub fn record(&mut self, file: &ProcessedFile) {
        if file.hash_failed {
            self.hash_failures += 1;
        }
        if file.keywords_attempted {
            self.keywords_attempted += 1;
        }
        if file.outcome.file_id().is_some() {
            self.files_recorded += 1;
        }

        match file.outcome {
            FileOutcome::Indexed { keywords, .. } => {
                self.keywords_generated += 1;
                self.keyword_records += keywords;
            }
            FileOutcome::MetadataOnly { .. } => self.metadata_only += 1,
            FileOutcome::ExtractionFailed { .. } => self.extraction_failures += 1,
            FileOutcome::KeywordsFailed { stored, .. } => {
                self.keyword_failures += 1;
                self.keyword_records += stored;
            }
            FileOutcome::StoreFailed => self.store_failures += 1,
            FileOutcome::Cancelled { .. } => self.cancelled = true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn processed(outcome: FileOutcome, hash_failed: bool, attempted: bool) -> ProcessedFile {
        ProcessedFile {
            path: PathBuf::from("/x"),
            hash_failed,
            keywords_attempted: attempted,
            outcome,
        }
    }

    #[test]
    fn test_record_counts() {
        let mut report = IndexReport::default();
        report.record(&processed(FileOutcome::Indexed { file_id: 1, keywords: 4 }, false, true));
        report.record(&processed(FileOutcome::MetadataOnly { file_id: 2 }, true, false));
        report.record(&processed(FileOutcome::KeywordsFailed { file_id: 3, stored: 0 }, false, true));
        report.record(&processed(FileOutcome::StoreFailed, false, false));

        assert_eq!(report.files_recorded, 3);
        assert_eq!(report.keyword_records, 4);
        assert_eq!(report.keywords_attempted, 2);
        assert_eq!(report.hash_failures, 1);
        assert_eq!(report.store_failures, 1);
        assert!(!report.cancelled);
    }

    #[test]
    fn test_partial_keyword_batches_are_counted() {
        let mut report = IndexReport::default();
        report.record(&processed(FileOutcome::KeywordsFailed { file_id: 1, stored: 100 }, false, true));

        assert_eq!(report.keyword_failures, 1);
        assert_eq!(report.keyword_records, 100);
        assert_eq!(report.keywords_generated, 0);
    }

    #[test]
    fn test_cancelled_after_record_counts_as_recorded() {
        let mut report = IndexReport::default();
        report.record(&processed(FileOutcome::Cancelled { file_id: Some(7) }, false, true));
        report.record(&processed(FileOutcome::Cancelled { file_id: None }, false, false));

        assert!(report.cancelled);
        assert_eq!(report.files_recorded, 1);
        assert_eq!(report.hash_failures, 0);
    }
}
