use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    InProgress,
    Succeeded,
    Failed,
    Skipped,
}

impl ItemStatus {
    /// True once the item has a final outcome for this run.
    pub fn is_resolved(self) -> bool {
        matches!(
            self,
            ItemStatus::Succeeded | ItemStatus::Failed | ItemStatus::Skipped
        )
    }

    /// Statuses only move forward. `InProgress` may be re-entered while a
    /// reconnect retries the same item, and may fall back to `Pending` when
    /// the run fails before the item resolves.
    pub fn can_become(self, next: ItemStatus) -> bool {
        use ItemStatus::*;
        matches!(
            (self, next),
            (Pending, InProgress)
                | (Pending, Skipped)
                | (InProgress, InProgress)
                | (InProgress, Succeeded)
                | (InProgress, Failed)
                | (InProgress, Skipped)
                | (InProgress, Pending)
        )
    }
}

impl fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ItemStatus::Pending => "pending",
            ItemStatus::InProgress => "in progress",
            ItemStatus::Succeeded => "succeeded",
            ItemStatus::Failed => "failed",
            ItemStatus::Skipped => "skipped",
        };
        f.write_str(label)
    }
}

/// One file to transfer. `index` is the position in the queue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransferItem {
    pub index: usize,
    pub local_path: PathBuf,
    pub remote_path: String,
    pub status: ItemStatus,
}

impl TransferItem {
    pub fn file_name(&self) -> String {
        self.local_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.local_path.display().to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ItemOutcome {
    Succeeded,
    Failed { reason: String },
    Skipped { reason: String },
}

impl ItemOutcome {
    pub fn status(&self) -> ItemStatus {
        match self {
            ItemOutcome::Succeeded => ItemStatus::Succeeded,
            ItemOutcome::Failed { .. } => ItemStatus::Failed,
            ItemOutcome::Skipped { .. } => ItemStatus::Skipped,
        }
    }
}

impl fmt::Display for ItemOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ItemOutcome::Succeeded => write!(f, "done"),
            ItemOutcome::Failed { reason } => write!(f, "failed: {reason}"),
            ItemOutcome::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}
