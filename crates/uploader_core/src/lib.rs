//! Uploader core: transfer data model and pure run-state bookkeeping.
mod config;
mod event;
mod item;
mod queue;
mod state;

pub use config::{AuthMode, ConnectionSpec, RunConfig, SpecError, DEFAULT_SSH_PORT};
pub use event::{CheckpointDecision, LogLevel, ProgressEvent};
pub use item::{ItemOutcome, ItemStatus, TransferItem};
pub use queue::{remote_path_for, TransferQueue};
pub use state::{Phase, RunState, RunSummary, TransitionError};
