//! Core data model for dedup runs.
//!
//! - FileEntry: a file found by the walker
//! - FileState: the per-file processing state machine
//! - OutcomeEvent: the terminal classification of one file
//! - RunSummary: aggregate counts for a complete run
//! - RunEvent: everything a run reports, as one channel-friendly enum

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ErrorKind;

/// A regular file discovered under the source root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    /// Full source path
    pub path: PathBuf,
    /// Size at enumeration time, when known (advisory only)
    pub size: Option<u64>,
}

/// Processing state of a single file.
///
/// Pending -> Hashing -> {Duplicate | Copying} -> {Copied | Failed}
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Pending,
    Hashing,
    Copying,
    Duplicate,
    Copied,
    Failed,
}

impl FileState {
    /// Returns true if this state is terminal (no further changes expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, FileState::Duplicate | FileState::Copied | FileState::Failed)
    }
}

/// The terminal classification of one processed file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum OutcomeEvent {
    /// First-seen content, copied to the destination
    Copied { path: PathBuf },
    /// Content already seen earlier in this run; left in place
    Duplicate { path: PathBuf },
    /// Could not be listed, hashed or copied
    Failed {
        path: PathBuf,
        kind: ErrorKind,
        message: String,
    },
}

impl OutcomeEvent {
    pub fn path(&self) -> &PathBuf {
        match self {
            OutcomeEvent::Copied { path }
            | OutcomeEvent::Duplicate { path }
            | OutcomeEvent::Failed { path, .. } => path,
        }
    }

    /// The terminal file state this outcome represents.
    pub fn state(&self) -> FileState {
        match self {
            OutcomeEvent::Copied { .. } => FileState::Copied,
            OutcomeEvent::Duplicate { .. } => FileState::Duplicate,
            OutcomeEvent::Failed { .. } => FileState::Failed,
        }
    }
}

/// Aggregate counts for one walk-hash-copy pass.
///
/// Once finalized, `total_files == duplicate_count + transferred_count + error_count`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub total_files: u64,
    pub duplicate_count: u64,
    pub transferred_count: u64,
    pub error_count: u64,
    pub bytes_transferred: u64,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl RunSummary {
    pub fn new(run_id: Uuid) -> Self {
        RunSummary {
            run_id,
            total_files: 0,
            duplicate_count: 0,
            transferred_count: 0,
            error_count: 0,
            bytes_transferred: 0,
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Count one outcome.
    pub fn record(&mut self, outcome: &OutcomeEvent) {
        self.total_files += 1;
        match outcome {
            OutcomeEvent::Copied { .. } => self.transferred_count += 1,
            OutcomeEvent::Duplicate { .. } => self.duplicate_count += 1,
            OutcomeEvent::Failed { .. } => self.error_count += 1,
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn is_balanced(&self) -> bool {
        self.total_files == self.duplicate_count + self.transferred_count + self.error_count
    }
}

/// Everything a run reports, in order: one `Started`, one `Outcome` per file,
/// one `Summary`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RunEvent {
    Started {
        run_id: Uuid,
        source: PathBuf,
        destination: PathBuf,
    },
    Outcome(OutcomeEvent),
    Summary(RunSummary),
}
