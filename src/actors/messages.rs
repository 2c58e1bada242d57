//! Message types for the scheduler actor

use serde::Serialize;
use tokio::sync::oneshot;

/// Commands that can be sent to a SchedulerActor
#[derive(Debug)]
pub enum SchedulerCommand {
    /// Run one full sweep right away, outside the minute schedule
    SweepNow {
        /// Channel to send the sweep outcome back
        respond_to: oneshot::Sender<SweepSummary>,
    },

    /// Stop the minute loop
    ///
    /// A sweep that is already running finishes first.
    Shutdown,
}

/// Outcome of one sweep over every target
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SweepSummary {
    /// Targets whose fetch succeeded
    pub succeeded: usize,

    /// Targets abandoned after exhausting their retries
    pub failed: usize,
}

impl SweepSummary {
    pub fn total(&self) -> usize {
        self.succeeded + self.failed
    }
}
