//! Uploader engine: protocol adapters and the run orchestrator.
mod connection_test;
mod engine;
mod orchestrator;
mod schedule;
mod session;
mod settings;
mod sftp;
mod sink;
mod types;

pub use connection_test::{test_connection, test_connection_blocking};
pub use engine::UploadHandle;
pub use orchestrator::Orchestrator;
pub use schedule::{sleep_or_cancel, GateOutcome, ScheduleGate, LONG_START_DELAY_MINUTES};
pub use session::{ProtocolClient, ProtocolSession};
pub use settings::{EngineSettings, ReconnectPolicy};
pub use sftp::{SftpClient, SftpSession, SftpSettings};
pub use sink::{ChannelProgressSink, ProgressSink};
pub use types::{ConnectError, EngineError, RunReport, UploadError};
