use std::error::Error;
use std::fmt;

use serde::Serialize;

use crate::ItemStatus;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Scheduled,
    Connecting,
    Uploading,
    AwaitingCheckpoint,
    Reconnecting,
    Cancelling,
    Completed,
    Cancelled,
    Failed,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Completed | Phase::Cancelled | Phase::Failed)
    }

    pub fn can_transition_to(self, next: Phase) -> bool {
        use Phase::*;
        if self.is_terminal() {
            return false;
        }
        if next == Cancelling {
            return self != Cancelling;
        }
        matches!(
            (self, next),
            (Idle, Scheduled)
                | (Scheduled, Connecting)
                | (Connecting, Uploading)
                | (Connecting, Failed)
                | (Uploading, AwaitingCheckpoint)
                | (Uploading, Reconnecting)
                | (Uploading, Completed)
                | (Uploading, Failed)
                | (AwaitingCheckpoint, Uploading)
                | (Reconnecting, Uploading)
                | (Reconnecting, Failed)
                | (Cancelling, Cancelled)
        )
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Phase::Idle => "idle",
            Phase::Scheduled => "scheduled",
            Phase::Connecting => "connecting",
            Phase::Uploading => "uploading",
            Phase::AwaitingCheckpoint => "awaiting checkpoint",
            Phase::Reconnecting => "reconnecting",
            Phase::Cancelling => "cancelling",
            Phase::Completed => "completed",
            Phase::Cancelled => "cancelled",
            Phase::Failed => "failed",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    Phase { from: Phase, to: Phase },
    Item {
        index: usize,
        from: ItemStatus,
        to: ItemStatus,
    },
    UnknownItem(usize),
}

impl fmt::Display for TransitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransitionError::Phase { from, to } => {
                write!(f, "illegal phase transition {from} -> {to}")
            }
            TransitionError::Item { index, from, to } => {
                write!(f, "illegal status change for item {index}: {from} -> {to}")
            }
            TransitionError::UnknownItem(index) => write!(f, "no queue item at index {index}"),
        }
    }
}

impl Error for TransitionError {}

/// Run progress owned by the orchestrator. Observers only ever see copies.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct RunState {
    pub phase: Phase,
    pub current_index: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub checkpoint_fired: bool,
}

impl RunState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn transition(&mut self, next: Phase) -> Result<(), TransitionError> {
        if !self.phase.can_transition_to(next) {
            return Err(TransitionError::Phase {
                from: self.phase,
                to: next,
            });
        }
        self.phase = next;
        Ok(())
    }

    /// Counts a resolved item and moves past it.
    pub fn record_and_advance(&mut self, status: ItemStatus) {
        match status {
            ItemStatus::Succeeded => self.succeeded += 1,
            ItemStatus::Failed => self.failed += 1,
            ItemStatus::Skipped => self.skipped += 1,
            ItemStatus::Pending | ItemStatus::InProgress => return,
        }
        self.current_index += 1;
    }

    /// Counts items skipped in bulk when a run stops early. The index stays
    /// where the run stopped.
    pub fn record_skipped(&mut self, count: usize) {
        self.skipped += count;
    }

    /// The test-batch pause fires once, exactly when `batch_size` items have
    /// been processed.
    pub fn checkpoint_due(&self, batch_size: usize) -> bool {
        batch_size > 0 && !self.checkpoint_fired && self.current_index == batch_size
    }

    pub fn mark_checkpoint(&mut self) {
        self.checkpoint_fired = true;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct RunSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub skipped: usize,
    pub pending: usize,
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} succeeded, {} failed, {} skipped, {} pending (of {})",
            self.succeeded, self.failed, self.skipped, self.pending, self.total
        )
    }
}
