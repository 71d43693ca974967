//! Error types for the dedup engine.
//!
//! `EngineError` covers run-level failures that stop a run before any file is
//! touched. Per-file failures (`WalkError`, `HashError`, `CopyError`) never
//! abort a run; the engine converts them into `OutcomeEvent::Failed` and
//! keeps going.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that prevent a run from starting or completing.
#[derive(Error, Debug)]
pub enum EngineError {
    /// The run configuration failed preflight validation.
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// The background worker thread panicked before producing a summary.
    #[error("Transfer worker panicked: {message}")]
    WorkerPanicked { message: String },
}

impl EngineError {
    /// Extract the OS error code from this error, if available.
    pub fn raw_os_error(&self) -> Option<i32> {
        match self {
            Self::Configuration(ConfigError::Inaccessible { source, .. }) => source.raw_os_error(),
            _ => None,
        }
    }
}

/// Preflight failures for a `RunConfig`.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Source directory not found: {}", path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Source is not a directory: {}", path.display())]
    SourceNotDirectory { path: PathBuf },

    #[error("Destination directory not found: {}", path.display())]
    DestinationNotFound { path: PathBuf },

    #[error("Destination is not a directory: {}", path.display())]
    DestinationNotDirectory { path: PathBuf },

    #[error("Source and destination must differ: {}", path.display())]
    SameDirectory { path: PathBuf },

    #[error("Chunk size must be greater than zero")]
    InvalidChunkSize,

    #[error("Cannot access {}: {source}", path.display())]
    Inaccessible {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Classification of a per-file failure, as reported to progress sinks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// A directory or entry could not be listed or inspected.
    AccessError,
    /// The file could not be fully read to compute its digest.
    HashFailure,
    /// Writing the unique copy to the destination failed.
    CopyFailure,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::AccessError => write!(f, "AccessError"),
            ErrorKind::HashFailure => write!(f, "HashFailure"),
            ErrorKind::CopyFailure => write!(f, "CopyFailure"),
        }
    }
}

/// A directory or entry that the walker could not read.
#[derive(Error, Debug)]
#[error("Failed to read {}: {source}", path.display())]
pub struct WalkError {
    pub path: PathBuf,
    #[source]
    pub source: io::Error,
}

/// Failure to compute a file's digest.
#[derive(Error, Debug)]
pub enum HashError {
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Failure to place a unique file at the destination.
#[derive(Error, Debug)]
pub enum CopyError {
    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Refusing to copy a file onto itself: {}", path.display())]
    SameFile { path: PathBuf },

    #[error("Source path has no file name: {}", path.display())]
    NoFileName { path: PathBuf },

    #[error("Verification failed for {}: destination content differs from source", path.display())]
    VerificationMismatch { path: PathBuf },

    #[error("Verification failed for {}: {source}", path.display())]
    Verification {
        path: PathBuf,
        #[source]
        source: HashError,
    },
}
