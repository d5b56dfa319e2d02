use std::time::Duration;

use uploader_core::{Phase, RunSummary, TransferItem};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConnectError {
    #[error("authentication failed for {username}: {message}")]
    AuthFailed { username: String, message: String },
    #[error("host unreachable: {0}")]
    Unreachable(String),
    #[error("connection timed out after {0:?}")]
    Timeout(Duration),
    #[error("cannot use key file {path}: {message}")]
    KeyFile { path: String, message: String },
    #[error("protocol error: {0}")]
    Protocol(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UploadError {
    #[error("cannot read local file: {0}")]
    LocalRead(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("remote error: {0}")]
    Remote(String),
    #[error("upload timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("failed to start orchestrator: {0}")]
    Startup(#[from] std::io::Error),
    #[error("orchestrator thread panicked")]
    WorkerPanicked,
    #[error(transparent)]
    Connect(#[from] ConnectError),
}

/// Final record of a run, available once the orchestrator has stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub phase: Phase,
    pub summary: RunSummary,
    pub items: Vec<TransferItem>,
}
