//! Directory traversal and per-file fan-out.

use std::fs::Metadata;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use ignore::WalkBuilder;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use super::cancel::CancelToken;
use super::error::IndexError;
use super::processor::FileProcessor;
use super::report::{IndexReport, ProcessedFile};
use crate::config::IndexerConfig;

const DISCOVERY_CHANNEL_SIZE: usize = 1024;

/// A regular file found by the traversal.
struct Discovered {
    path: PathBuf,
    meta: Metadata,
}

/// Walks a directory tree and runs one [`FileProcessor`] pipeline per
/// regular file.
///
/// Traversal happens on a blocking thread and streams files to the
/// coordinator, which spawns a task per file. At most
/// `max_concurrent_files` pipelines are in flight; [`walk`](Self::walk)
/// returns only after every spawned pipeline has finished.
pub struct DirectoryWalker {
    processor: Arc<FileProcessor>,
    file_gate: Arc<Semaphore>,
    follow_links: bool,
    cancel: CancelToken,
}

impl DirectoryWalker {
    pub fn new(processor: Arc<FileProcessor>, config: &IndexerConfig, cancel: CancelToken) -> Self {
        Self {
            processor,
            file_gate: Arc::new(Semaphore::new(config.max_concurrent_files.max(1))),
            follow_links: config.follow_links,
            cancel,
        }
    }

    /// Token that aborts this walker's runs.
    pub fn cancel_token(&self) -> &CancelToken {
        &self.cancel
    }

    /// Index every regular file below `root`.
    ///
    /// Only an unusable root is an error; everything that goes wrong for an
    /// individual entry or file is logged and counted in the report.
    pub async fn walk(&self, root: &Path) -> Result<IndexReport, IndexError> {
        check_root(root)?;

        let started = Instant::now();
        info!(root = %root.display(), "indexing directory");

        let (tx, mut rx) = mpsc::channel::<Discovered>(DISCOVERY_CHANNEL_SIZE);
        let traversal = {
            let root = root.to_path_buf();
            let follow_links = self.follow_links;
            let verbose = self.processor.verbose();
            let cancel = self.cancel.clone();
            tokio::task::spawn_blocking(move || traverse(&root, follow_links, verbose, &cancel, &tx))
        };

        let mut report = IndexReport::default();
        let mut tasks: JoinSet<ProcessedFile> = JoinSet::new();

        while let Some(file) = rx.recv().await {
            let permit = tokio::select! {
                permit = Arc::clone(&self.file_gate).acquire_owned() => match permit {
                    Ok(permit) => permit,
                    Err(_) => break,
                },
                _ = self.cancel.cancelled() => break,
            };

            report.files_seen += 1;

            let processor = Arc::clone(&self.processor);
            let cancel = self.cancel.clone();
            tasks.spawn(async move {
                let _permit = permit;
                processor.process(file.path, file.meta, &cancel).await
            });

            while let Some(done) = tasks.try_join_next() {
                collect(&mut report, done);
            }
        }
        // Stops the traversal if the loop ended early.
        drop(rx);

        match traversal.await {
            Ok(walk_errors) => report.walk_errors = walk_errors,
            Err(e) => warn!(error = %e, "directory traversal task failed"),
        }

        while let Some(done) = tasks.join_next().await {
            collect(&mut report, done);
        }

        report.cancelled |= self.cancel.is_cancelled();
        report.elapsed = started.elapsed();

        info!(
            root = %root.display(),
            files = report.files_seen,
            recorded = report.files_recorded,
            keywords = report.keyword_records,
            walk_errors = report.walk_errors,
            cancelled = report.cancelled,
            elapsed_ms = report.elapsed.as_millis() as u64,
            "indexing finished"
        );

        Ok(report)
    }
}

fn check_root(root: &Path) -> Result<(), IndexError> {
    if root.as_os_str().is_empty() {
        return Err(IndexError::EmptyRoot);
    }

    let meta = std::fs::metadata(root).map_err(|source| match source.kind() {
        io::ErrorKind::NotFound => IndexError::RootNotFound(root.to_path_buf()),
        _ => IndexError::Io {
            path: root.to_path_buf(),
            source,
        },
    })?;

    if !meta.is_dir() {
        return Err(IndexError::RootNotDirectory(root.to_path_buf()));
    }
    Ok(())
}

fn collect(report: &mut IndexReport, done: Result<ProcessedFile, tokio::task::JoinError>) {
    match done {
        Ok(file) => report.record(&file),
        Err(e) => {
            warn!(error = %e, "file pipeline panicked");
            report.task_failures += 1;
        }
    }
}

/// Enumerate regular files and send them to the coordinator. Returns the
/// number of entries that could not be read.
fn traverse(
    root: &Path,
    follow_links: bool,
    verbose: bool,
    cancel: &CancelToken,
    tx: &mpsc::Sender<Discovered>,
) -> usize {
    let walker = WalkBuilder::new(root)
        .standard_filters(false)
        .hidden(false)
        .follow_links(follow_links)
        .build();

    let mut errors = 0;

    for entry in walker {
        if cancel.is_cancelled() {
            debug!("traversal cancelled");
            break;
        }

        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                errors += 1;
                if verbose {
                    warn!(error = %e, "skipping unreadable entry");
                } else {
                    debug!(error = %e, "skipping unreadable entry");
                }
                continue;
            }
        };

        // Symlinks are only resolved when following links; a dangling or
        // unfollowed link is not a regular file.
        if !entry.file_type().is_some_and(|t| t.is_file()) {
            continue;
        }

        let meta = match entry.metadata() {
            Ok(meta) => meta,
            Err(e) => {
                errors += 1;
                if verbose {
                    warn!(path = %entry.path().display(), error = %e, "cannot stat file");
                } else {
                    debug!(path = %entry.path().display(), error = %e, "cannot stat file");
                }
                continue;
            }
        };

        let file = Discovered {
            path: entry.into_path(),
            meta,
        };
        if tx.blocking_send(file).is_err() {
            break;
        }
    }

    errors
}
