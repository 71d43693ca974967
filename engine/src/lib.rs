//! # uniqmove engine - content-addressed unique file transfer
//!
//! A headless engine that copies each distinct file content found under a
//! source tree into a flat destination directory exactly once. Files whose
//! bytes match a file already seen in the same run are reported as duplicates
//! and left where they are.
//!
//! It features:
//! - Deterministic, recursive enumeration (depth-first, sorted by name)
//! - Streaming 128-bit content digests (MD5 or truncated BLAKE3)
//! - Per-file error isolation: failures are reported, never fatal to a run
//! - Progress reporting via a sink trait or a channel (decoupled from UI)
//! - Background execution on a worker thread
//!
//! ## Basic Usage
//!
//! ```no_run
//! use engine::{run_transfer, NullSink, RunConfig};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = RunConfig::new("/data/inbox", "/data/unique");
//! let summary = run_transfer(&config, &NullSink)?;
//! println!(
//!     "{} files: {} copied, {} duplicates, {} errors",
//!     summary.total_files,
//!     summary.transferred_count,
//!     summary.duplicate_count,
//!     summary.error_count,
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Modules
//!
//! - **model**: FileEntry, OutcomeEvent, RunSummary, RunEvent
//! - **error**: run-level and per-file error types
//! - **config**: RunConfig and preflight validation
//! - **digest**: ContentDigest and streaming hashing
//! - **index**: the per-run DedupIndex
//! - **walker**: source tree enumeration
//! - **fs_ops**: destination naming and copying
//! - **transfer**: the TransferEngine
//! - **progress**: ProgressSink trait and sinks
//! - **worker**: background execution

pub mod config;
pub mod digest;
pub mod error;
pub mod fs_ops;
pub mod index;
pub mod model;
pub mod progress;
pub mod transfer;
pub mod walker;
pub mod worker;

// Re-export main types and functions
pub use config::RunConfig;
pub use digest::{digest_file, ContentDigest, DigestAlgorithm, DEFAULT_CHUNK_SIZE};
pub use error::{ConfigError, EngineError, ErrorKind};
pub use index::DedupIndex;
pub use model::{FileEntry, FileState, OutcomeEvent, RunEvent, RunSummary};
pub use progress::{ChannelSink, NullSink, ProgressSink};
pub use transfer::{run_transfer, TransferEngine};
pub use walker::{enumerate_files, Walker};
pub use worker::{spawn_transfer, TransferHandle};
