use std::time::Duration;

use serde::Serialize;

use crate::{ItemOutcome, Phase, RunState, RunSummary, TransferItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Operator answer to a test-batch pause.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckpointDecision {
    Continue,
    Abort,
}

/// Structured event emitted by the orchestrator, in production order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    PhaseChanged(RunState),
    CountdownTick {
        remaining: Duration,
    },
    /// Wait between two files; `next_index` is the item uploaded next.
    DelayTick {
        remaining: Duration,
        next_index: usize,
    },
    ConnectionEstablished {
        remote_home: Option<String>,
    },
    ItemStarted(TransferItem),
    ItemFinished {
        item: TransferItem,
        outcome: ItemOutcome,
    },
    CheckpointReached {
        uploaded_so_far: usize,
    },
    ReconnectAttempt {
        attempt: u32,
    },
    Log {
        level: LogLevel,
        message: String,
    },
    RunEnded {
        phase: Phase,
        summary: RunSummary,
    },
}

impl ProgressEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ProgressEvent::RunEnded { .. })
    }
}
