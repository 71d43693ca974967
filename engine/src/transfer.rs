//! Run orchestration.
//!
//! `TransferEngine` drives one run: walk the source tree, hash each file,
//! consult the dedup index, copy first-seen files, and report every file's
//! outcome to a `ProgressSink`. Individual file failures are recorded and
//! reported but never stop the run.

use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::config::RunConfig;
use crate::digest::{digest_file, ContentDigest};
use crate::error::{CopyError, EngineError, ErrorKind, WalkError};
use crate::fs_ops;
use crate::index::DedupIndex;
use crate::model::{FileEntry, FileState, OutcomeEvent, RunSummary};
use crate::progress::ProgressSink;
use crate::walker::Walker;

/// Executes a single dedup run.
///
/// The dedup index and counters live exactly as long as the engine, so a
/// new engine is needed for every run.
pub struct TransferEngine {
    config: RunConfig,
    index: DedupIndex,
    summary: RunSummary,
}

impl TransferEngine {
    /// Create an engine for `config`.
    ///
    /// # Errors
    /// Returns `EngineError::Configuration` if the directories are missing,
    /// not directories, or the same directory.
    pub fn new(config: RunConfig) -> Result<Self, EngineError> {
        config.validate()?;
        Ok(TransferEngine {
            config,
            index: DedupIndex::new(),
            summary: RunSummary::new(Uuid::new_v4()),
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.summary.run_id
    }

    /// Process every file under the source root and return the totals.
    ///
    /// A destination nested inside the source tree is not walked.
    pub fn run(self, sink: &dyn ProgressSink) -> RunSummary {
        let walker = Walker::new(&self.config.source).excluding(&self.config.destination);
        self.run_items(walker.iter(), sink)
    }

    /// Drive the per-file pipeline over already enumerated items.
    fn run_items<I>(mut self, items: I, sink: &dyn ProgressSink) -> RunSummary
    where
        I: IntoIterator<Item = Result<FileEntry, WalkError>>,
    {
        info!(
            run_id = %self.summary.run_id,
            source = %self.config.source.display(),
            destination = %self.config.destination.display(),
            algorithm = %self.config.algorithm,
            "Starting dedup run"
        );
        sink.on_run_started(self.summary.run_id, &self.config.source, &self.config.destination);

        for item in items {
            let outcome = match item {
                Ok(entry) => self.process_file(&entry),
                Err(e) => access_failure(e),
            };

            self.summary.record(&outcome);
            sink.on_outcome(&outcome);
        }

        self.summary.finish();
        debug_assert!(self.summary.is_balanced());
        info!(
            run_id = %self.summary.run_id,
            total = self.summary.total_files,
            duplicates = self.summary.duplicate_count,
            transferred = self.summary.transferred_count,
            errors = self.summary.error_count,
            unique_digests = self.index.len(),
            "Dedup run complete"
        );
        sink.on_summary(&self.summary);

        self.summary
    }

    /// Take one file from Pending to a terminal state.
    fn process_file(&mut self, entry: &FileEntry) -> OutcomeEvent {
        let path = &entry.path;
        let mut state = FileState::Pending;
        debug!(path = %path.display(), size = ?entry.size, ?state, "Visiting file");

        state = FileState::Hashing;
        let digest = match digest_file(path, self.config.algorithm, self.config.chunk_size) {
            Ok(digest) => digest,
            Err(e) => {
                warn!(path = %path.display(), ?state, error = %e, "Hashing failed");
                return OutcomeEvent::Failed {
                    path: path.clone(),
                    kind: ErrorKind::HashFailure,
                    message: e.to_string(),
                };
            }
        };

        if !self.index.try_insert(digest) {
            debug!(path = %path.display(), %digest, "Duplicate content");
            return OutcomeEvent::Duplicate { path: path.clone() };
        }

        state = FileState::Copying;
        match self.copy_unique(entry, digest) {
            Ok(bytes) => {
                self.summary.bytes_transferred += bytes;
                debug!(path = %path.display(), %digest, bytes, "Copied unique file");
                OutcomeEvent::Copied { path: path.clone() }
            }
            Err(e) => {
                warn!(path = %path.display(), ?state, error = %e, "Copy failed");
                OutcomeEvent::Failed {
                    path: path.clone(),
                    kind: ErrorKind::CopyFailure,
                    message: e.to_string(),
                }
            }
        }
    }

    fn copy_unique(&self, entry: &FileEntry, digest: ContentDigest) -> Result<u64, CopyError> {
        let dst = fs_ops::destination_for(&entry.path, &self.config.destination)?;
        let bytes = fs_ops::copy_file_with_metadata(&entry.path, &dst, self.config.preserve_mtime)?;

        if self.config.verify_after_copy {
            let copied = digest_file(&dst, self.config.algorithm, self.config.chunk_size)
                .map_err(|e| CopyError::Verification {
                    path: dst.clone(),
                    source: e,
                })?;
            if copied != digest {
                return Err(CopyError::VerificationMismatch { path: dst });
            }
        }

        Ok(bytes)
    }
}

fn access_failure(e: WalkError) -> OutcomeEvent {
    warn!(path = %e.path.display(), error = %e.source, "Cannot access entry");
    OutcomeEvent::Failed {
        message: e.to_string(),
        path: e.path,
        kind: ErrorKind::AccessError,
    }
}

/// Run a complete dedup pass on the calling thread.
///
/// # Errors
/// Returns `EngineError` only when the configuration is invalid; no file is
/// touched in that case. File-level failures are reported through `sink`
/// and counted in the returned summary.
pub fn run_transfer(config: &RunConfig, sink: &dyn ProgressSink) -> Result<RunSummary, EngineError> {
    let engine = TransferEngine::new(config.clone())?;
    Ok(engine.run(sink))
}
