//! Background execution of a dedup run.
//!
//! The caller's thread stays free while the run walks, hashes and copies on a
//! dedicated worker thread. Events come back over a crossbeam channel.

use std::thread::{self, JoinHandle};

use crossbeam_channel::{unbounded, Receiver};
use tracing::error;

use crate::config::RunConfig;
use crate::error::EngineError;
use crate::model::{RunEvent, RunSummary};
use crate::progress::ChannelSink;
use crate::transfer::run_transfer;

/// Handle to a run executing on a worker thread.
pub struct TransferHandle {
    events: Receiver<RunEvent>,
    thread: JoinHandle<Result<RunSummary, EngineError>>,
}

impl TransferHandle {
    /// Events in the order the run produced them. The channel closes when
    /// the worker finishes.
    pub fn events(&self) -> &Receiver<RunEvent> {
        &self.events
    }

    pub fn is_finished(&self) -> bool {
        self.thread.is_finished()
    }

    /// Wait for the worker and return the run's result.
    pub fn join(self) -> Result<RunSummary, EngineError> {
        match self.thread.join() {
            Ok(result) => result,
            Err(panic) => {
                let message = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                error!(%message, "Transfer worker panicked");
                Err(EngineError::WorkerPanicked { message })
            }
        }
    }
}

/// Spawn a background worker thread to execute a dedup run.
///
/// Configuration errors surface through [`TransferHandle::join`]; in that
/// case the channel closes without any events.
pub fn spawn_transfer(config: RunConfig) -> TransferHandle {
    let (tx, rx) = unbounded::<RunEvent>();

    let thread = thread::spawn(move || {
        let sink = ChannelSink::new(tx);
        run_transfer(&config, &sink)
    });

    TransferHandle { events: rx, thread }
}
