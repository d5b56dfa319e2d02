use std::sync::mpsc;

use uploader_core::{LogLevel, ProgressEvent};
use uploader_logging::{uploader_debug, uploader_error, uploader_info, uploader_warn};

/// Receives orchestrator events in production order.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, event: ProgressEvent);
}

pub struct ChannelProgressSink {
    tx: mpsc::Sender<ProgressEvent>,
}

impl ChannelProgressSink {
    pub fn new(tx: mpsc::Sender<ProgressEvent>) -> Self {
        Self { tx }
    }
}

impl ProgressSink for ChannelProgressSink {
    fn emit(&self, event: ProgressEvent) {
        // The observer may have gone away; the run carries on regardless.
        let _ = self.tx.send(event);
    }
}

/// Emits a `Log` event and mirrors it to the logging facade.
pub(crate) fn emit_log(sink: &dyn ProgressSink, level: LogLevel, message: impl Into<String>) {
    let message = message.into();
    match level {
        LogLevel::Debug => uploader_debug!("{}", message),
        LogLevel::Info => uploader_info!("{}", message),
        LogLevel::Warn => uploader_warn!("{}", message),
        LogLevel::Error => uploader_error!("{}", message),
    }
    sink.emit(ProgressEvent::Log { level, message });
}
