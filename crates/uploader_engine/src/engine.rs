use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use uploader_core::{CheckpointDecision, ConnectionSpec, ProgressEvent, RunConfig, TransferQueue};
use uploader_logging::uploader_info;

use crate::orchestrator::Orchestrator;
use crate::sink::{ChannelProgressSink, ProgressSink};
use crate::{EngineError, EngineSettings, ProtocolClient, RunReport};

/// Caller-side handle to a run executing on its own thread.
pub struct UploadHandle {
    cancel: CancellationToken,
    decision_tx: tokio::sync::mpsc::UnboundedSender<CheckpointDecision>,
    event_rx: mpsc::Receiver<ProgressEvent>,
    worker: thread::JoinHandle<RunReport>,
}

impl UploadHandle {
    /// Spawns the orchestrator thread and returns immediately.
    pub fn start(
        client: Arc<dyn ProtocolClient>,
        spec: ConnectionSpec,
        queue: TransferQueue,
        config: RunConfig,
        settings: EngineSettings,
    ) -> Result<Self, EngineError> {
        let (event_tx, event_rx) = mpsc::channel();
        let (decision_tx, decision_rx) = tokio::sync::mpsc::unbounded_channel();
        let cancel = CancellationToken::new();
        let sink: Arc<dyn ProgressSink> = Arc::new(ChannelProgressSink::new(event_tx));

        uploader_info!(
            "Starting run: {} files to {} (delay {}s, test batch {}, start in {} min)",
            queue.len(),
            spec.address(),
            config.inter_item_delay_secs,
            config.test_batch_size,
            config.start_delay_minutes
        );
        let orchestrator = Orchestrator::new(
            client,
            spec,
            queue,
            config,
            settings,
            sink,
            cancel.clone(),
            decision_rx,
        );

        let runtime = tokio::runtime::Runtime::new()?;
        let worker = thread::Builder::new()
            .name("upload-orchestrator".to_string())
            .spawn(move || {
                let report = runtime.block_on(orchestrator.run());
                // Abandoned blocking calls (a connect raced by cancel) must
                // not hold the thread.
                runtime.shutdown_background();
                report
            })?;

        Ok(Self {
            cancel,
            decision_tx,
            event_rx,
            worker,
        })
    }

    /// Requests cancellation. Idempotent; ignored once the run has ended.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Answers a pending test-batch checkpoint.
    pub fn resolve_checkpoint(&self, decision: CheckpointDecision) {
        let _ = self.decision_tx.send(decision);
    }

    pub fn try_recv(&self) -> Option<ProgressEvent> {
        self.event_rx.try_recv().ok()
    }

    pub fn recv_timeout(&self, timeout: Duration) -> Option<ProgressEvent> {
        self.event_rx.recv_timeout(timeout).ok()
    }

    /// Blocking iterator over events; ends after `RunEnded`.
    pub fn events(&self) -> mpsc::Iter<'_, ProgressEvent> {
        self.event_rx.iter()
    }

    pub fn is_finished(&self) -> bool {
        self.worker.is_finished()
    }

    /// Waits for the orchestrator thread and returns the final record.
    pub fn wait(self) -> Result<RunReport, EngineError> {
        self.worker.join().map_err(|_| EngineError::WorkerPanicked)
    }
}
