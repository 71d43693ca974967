//! Progress reporting.
//!
//! `ProgressSink` decouples the engine from whoever renders progress (CLI,
//! GUI, automation). `ChannelSink` forwards everything as `RunEvent`s over a
//! crossbeam channel for hosts that consume events on another thread.

use std::path::Path;

use crossbeam_channel::Sender;
use uuid::Uuid;

use crate::model::{OutcomeEvent, RunEvent, RunSummary};

/// Receives events from a dedup run.
///
/// All methods are called synchronously on the thread executing the run,
/// in order: `on_run_started`, one `on_outcome` per file in walk order, then
/// `on_summary`. Implementations that need to reach another thread must do
/// the marshalling themselves.
pub trait ProgressSink: Send {
    /// Called once before the first file is visited.
    fn on_run_started(&self, _run_id: Uuid, _source: &Path, _destination: &Path) {}

    /// Called once per processed file with its terminal classification.
    fn on_outcome(&self, outcome: &OutcomeEvent);

    /// Called once with the finalized totals.
    fn on_summary(&self, summary: &RunSummary);
}

/// A sink that discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl ProgressSink for NullSink {
    fn on_outcome(&self, _outcome: &OutcomeEvent) {}

    fn on_summary(&self, _summary: &RunSummary) {}
}

/// Forwards events into a channel.
///
/// If the receiver has been dropped the events are discarded and the run
/// carries on.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<RunEvent>,
}

impl ChannelSink {
    pub fn new(sender: Sender<RunEvent>) -> Self {
        ChannelSink { sender }
    }
}

impl ProgressSink for ChannelSink {
    fn on_run_started(&self, run_id: Uuid, source: &Path, destination: &Path) {
        let _ = self.sender.send(RunEvent::Started {
            run_id,
            source: source.to_path_buf(),
            destination: destination.to_path_buf(),
        });
    }

    fn on_outcome(&self, outcome: &OutcomeEvent) {
        let _ = self.sender.send(RunEvent::Outcome(outcome.clone()));
    }

    fn on_summary(&self, summary: &RunSummary) {
        let _ = self.sender.send(RunEvent::Summary(summary.clone()));
    }
}
