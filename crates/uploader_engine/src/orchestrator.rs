use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uploader_core::{
    CheckpointDecision, ConnectionSpec, ItemOutcome, ItemStatus, LogLevel, Phase, ProgressEvent,
    RunConfig, RunState, TransferItem, TransferQueue,
};
use uploader_logging::{uploader_error, uploader_warn};

use crate::schedule::{count_down, sleep_or_cancel, GateOutcome, ScheduleGate};
use crate::sink::{emit_log, ProgressSink};
use crate::{
    ConnectError, EngineSettings, ProtocolClient, ProtocolSession, RunReport, UploadError,
};

type Session = Box<dyn ProtocolSession>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    Completed,
    Cancelled,
    Failed,
}

enum Interrupt {
    Cancelled,
    Connect(ConnectError),
}

enum Reconnect {
    Restored,
    Cancelled,
    Exhausted,
}

/// Drives one run: countdown, connect, upload loop, checkpoint, reconnects.
///
/// Owns the session, the queue and the run state for the whole run. Every
/// session it opens is closed before the run ends. Other
/// threads reach it only through the cancel token and the checkpoint
/// decision channel.
pub struct Orchestrator {
    client: Arc<dyn ProtocolClient>,
    spec: ConnectionSpec,
    queue: TransferQueue,
    config: RunConfig,
    settings: EngineSettings,
    state: RunState,
    sink: Arc<dyn ProgressSink>,
    cancel: CancellationToken,
    decisions: mpsc::UnboundedReceiver<CheckpointDecision>,
    session: Option<Session>,
}

impl Orchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        client: Arc<dyn ProtocolClient>,
        spec: ConnectionSpec,
        queue: TransferQueue,
        config: RunConfig,
        settings: EngineSettings,
        sink: Arc<dyn ProgressSink>,
        cancel: CancellationToken,
        decisions: mpsc::UnboundedReceiver<CheckpointDecision>,
    ) -> Self {
        Self {
            client,
            spec,
            queue,
            config,
            settings,
            state: RunState::new(),
            sink,
            cancel,
            decisions,
            session: None,
        }
    }

    pub async fn run(mut self) -> RunReport {
        let end = self.drive().await;
        self.finish(end).await
    }

    async fn drive(&mut self) -> End {
        self.enter(Phase::Scheduled);
        let gate = ScheduleGate::new(self.config.start_delay(), self.settings.countdown_tick);
        if gate.wait(&self.cancel, self.sink.as_ref()).await == GateOutcome::Cancelled {
            return self.begin_cancel("Stopped before the upload started");
        }

        self.enter(Phase::Connecting);
        self.log(
            LogLevel::Info,
            format!("Connecting to {} as {}", self.spec.address(), self.spec.username),
        );
        let session = match self.connect().await {
            Ok(session) => session,
            Err(Interrupt::Cancelled) => return self.begin_cancel("Stopped while connecting"),
            Err(Interrupt::Connect(err)) => {
                self.log(LogLevel::Error, format!("Connection failed: {err}"));
                return End::Failed;
            }
        };
        let remote_home = session.remote_home();
        self.log(
            LogLevel::Info,
            match &remote_home {
                Some(home) => format!("Connected (remote home: {home})"),
                None => "Connected".to_string(),
            },
        );
        self.session = Some(session);
        self.sink
            .emit(ProgressEvent::ConnectionEstablished { remote_home });
        self.enter(Phase::Uploading);

        self.upload_all().await
    }

    async fn upload_all(&mut self) -> End {
        let total = self.queue.len();
        let delay = self.config.inter_item_delay();
        // Reconnects spent on the current item, so one poisonous file cannot
        // loop forever.
        let mut item_reconnects = 0u32;

        while self.state.current_index < total {
            let index = self.state.current_index;
            if self.cancel.is_cancelled() {
                return self.begin_cancel("Stopped by user");
            }
            uploader_logging::set_current_item(index);
            let Some(item) = self.queue.get(index).cloned() else {
                break;
            };
            let position = format!("[{:02}/{}]", index + 1, total);

            if !item.local_path.exists() {
                self.log(
                    LogLevel::Warn,
                    format!("{position} skipping {}: local file not found", item.file_name()),
                );
                self.resolve(
                    index,
                    ItemOutcome::Skipped {
                        reason: "local file not found".into(),
                    },
                );
            } else {
                self.begin_item(index);
                self.log(
                    LogLevel::Info,
                    format!("{position} uploading {} -> {}", item.file_name(), item.remote_path),
                );
                match self.upload(&item).await {
                    Ok(()) => {
                        item_reconnects = 0;
                        self.resolve(index, ItemOutcome::Succeeded);
                    }
                    Err(err) => {
                        self.log(LogLevel::Warn, format!("{position} upload failed: {err}"));
                        if self.check_alive().await {
                            item_reconnects = 0;
                            self.resolve(
                                index,
                                ItemOutcome::Failed {
                                    reason: err.to_string(),
                                },
                            );
                        } else if item_reconnects >= self.settings.reconnect.max_attempts {
                            self.log(
                                LogLevel::Error,
                                format!(
                                    "{position} giving up on {} after {item_reconnects} reconnects",
                                    item.file_name()
                                ),
                            );
                            item_reconnects = 0;
                            self.resolve(
                                index,
                                ItemOutcome::Failed {
                                    reason: err.to_string(),
                                },
                            );
                        } else {
                            self.log(LogLevel::Warn, "Connection lost");
                            match self.reconnect().await {
                                Reconnect::Restored => {
                                    item_reconnects += 1;
                                    // Same index again: the item is re-sent from scratch.
                                    continue;
                                }
                                Reconnect::Cancelled => {
                                    return self.begin_cancel("Stopped while reconnecting");
                                }
                                Reconnect::Exhausted => {
                                    self.release_item(index);
                                    return End::Failed;
                                }
                            }
                        }
                    }
                }
            }

            if self.config.checkpoint_enabled()
                && self.state.checkpoint_due(self.config.test_batch_size)
                && !self.await_checkpoint().await
            {
                return End::Cancelled;
            }

            if self.state.current_index < total && !delay.is_zero() {
                uploader_logging::clear_current_item();
                let next_index = self.state.current_index;
                let waited = count_down(
                    delay,
                    self.settings.countdown_tick,
                    &self.cancel,
                    self.sink.as_ref(),
                    |remaining| ProgressEvent::DelayTick {
                        remaining,
                        next_index,
                    },
                )
                .await;
                if !waited {
                    return self.begin_cancel("Stopped during the delay between files");
                }
                if delay >= self.settings.idle_check_threshold && !self.check_alive().await {
                    self.log(LogLevel::Warn, "Session dropped during the delay");
                    match self.reconnect().await {
                        Reconnect::Restored => {}
                        Reconnect::Cancelled => {
                            return self.begin_cancel("Stopped while reconnecting");
                        }
                        Reconnect::Exhausted => return End::Failed,
                    }
                }
            }
        }

        uploader_logging::clear_current_item();
        End::Completed
    }

    async fn connect(&self) -> Result<Session, Interrupt> {
        let timeout = self.settings.connect_timeout;
        tokio::select! {
            biased;
            _ = self.cancel.cancelled() => Err(Interrupt::Cancelled),
            result = tokio::time::timeout(timeout, self.client.connect(&self.spec)) => match result {
                Ok(Ok(session)) => Ok(session),
                Ok(Err(err)) => Err(Interrupt::Connect(err)),
                Err(_) => Err(Interrupt::Connect(ConnectError::Timeout(timeout))),
            },
        }
    }

    /// Not wrapped in a timeout here: the adapter bounds each protocol
    /// operation itself, so a slow transfer is never abandoned mid-write.
    async fn upload(&mut self, item: &TransferItem) -> Result<(), UploadError> {
        match self.session.as_mut() {
            Some(session) => session.upload(item).await,
            None => Err(UploadError::Remote("no open session".into())),
        }
    }

    async fn check_alive(&mut self) -> bool {
        match self.session.as_mut() {
            Some(session) => {
                tokio::time::timeout(self.settings.liveness_timeout, session.is_alive())
                    .await
                    .unwrap_or(false)
            }
            None => false,
        }
    }

    async fn close_session(&mut self) {
        if let Some(mut session) = self.session.take() {
            if tokio::time::timeout(self.settings.liveness_timeout, session.close())
                .await
                .is_err()
            {
                uploader_warn!("Timed out closing the session");
            }
        }
    }

    async fn reconnect(&mut self) -> Reconnect {
        self.close_session().await;
        self.enter(Phase::Reconnecting);
        let policy = self.settings.reconnect;
        for attempt in 1..=policy.max_attempts {
            self.log(
                LogLevel::Info,
                format!("Reconnecting (attempt {attempt}/{})", policy.max_attempts),
            );
            self.sink.emit(ProgressEvent::ReconnectAttempt { attempt });
            match self.connect().await {
                Ok(session) => {
                    self.session = Some(session);
                    self.log(LogLevel::Info, "Reconnected");
                    self.enter(Phase::Uploading);
                    return Reconnect::Restored;
                }
                Err(Interrupt::Cancelled) => return Reconnect::Cancelled,
                Err(Interrupt::Connect(err)) => {
                    self.log(
                        LogLevel::Warn,
                        format!("Reconnect attempt {attempt} failed: {err}"),
                    );
                    if attempt < policy.max_attempts
                        && !sleep_or_cancel(policy.delay_after(attempt), &self.cancel).await
                    {
                        return Reconnect::Cancelled;
                    }
                }
            }
        }
        self.log(
            LogLevel::Error,
            format!("Giving up after {} reconnect attempts", policy.max_attempts),
        );
        Reconnect::Exhausted
    }

    /// Returns true when the operator chose to continue.
    async fn await_checkpoint(&mut self) -> bool {
        self.state.mark_checkpoint();
        let done = self.state.current_index;
        uploader_logging::clear_current_item();
        self.log(
            LogLevel::Info,
            format!("Test batch done ({done} files), waiting for continue or abort"),
        );
        // Decisions sent before this pause do not count.
        while self.decisions.try_recv().is_ok() {}
        self.enter(Phase::AwaitingCheckpoint);
        self.sink.emit(ProgressEvent::CheckpointReached {
            uploaded_so_far: done,
        });

        let decision = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => None,
            decision = self.decisions.recv() => Some(decision.unwrap_or(CheckpointDecision::Abort)),
        };
        match decision {
            Some(CheckpointDecision::Continue) => {
                self.log(LogLevel::Info, "Continuing after test batch");
                self.enter(Phase::Uploading);
                true
            }
            Some(CheckpointDecision::Abort) => {
                self.begin_cancel("Stopped after test batch");
                false
            }
            None => {
                self.begin_cancel("Stopped at test batch checkpoint");
                false
            }
        }
    }

    fn begin_item(&mut self, index: usize) {
        match self.queue.set_status(index, ItemStatus::InProgress) {
            Ok(item) => {
                let item = item.clone();
                self.sink.emit(ProgressEvent::ItemStarted(item));
            }
            Err(err) => uploader_error!("{}", err),
        }
    }

    fn resolve(&mut self, index: usize, outcome: ItemOutcome) {
        let status = outcome.status();
        match self.queue.set_status(index, status) {
            Ok(item) => {
                let item = item.clone();
                self.sink.emit(ProgressEvent::ItemFinished { item, outcome });
            }
            Err(err) => uploader_error!("{}", err),
        }
        self.state.record_and_advance(status);
    }

    fn release_item(&mut self, index: usize) {
        if let Err(err) = self.queue.set_status(index, ItemStatus::Pending) {
            uploader_error!("{}", err);
        }
    }

    fn begin_cancel(&mut self, reason: &str) -> End {
        self.log(LogLevel::Info, reason);
        self.enter(Phase::Cancelling);
        End::Cancelled
    }

    fn enter(&mut self, phase: Phase) {
        if let Err(err) = self.state.transition(phase) {
            uploader_error!("{}", err);
            return;
        }
        self.sink.emit(ProgressEvent::PhaseChanged(self.state.clone()));
    }

    fn log(&self, level: LogLevel, message: impl Into<String>) {
        emit_log(self.sink.as_ref(), level, message);
    }

    async fn finish(mut self, end: End) -> RunReport {
        uploader_logging::clear_current_item();
        self.close_session().await;
        let phase = match end {
            End::Completed => Phase::Completed,
            End::Failed => Phase::Failed,
            End::Cancelled => {
                if self.state.phase != Phase::Cancelling {
                    self.enter(Phase::Cancelling);
                }
                let skipped = self.queue.skip_remaining(self.state.current_index);
                self.state.record_skipped(skipped);
                Phase::Cancelled
            }
        };
        self.enter(phase);

        let summary = self.queue.summary();
        let level = match phase {
            Phase::Failed => LogLevel::Error,
            _ => LogLevel::Info,
        };
        self.log(level, format!("Run {phase}: {summary}"));
        self.sink.emit(ProgressEvent::RunEnded { phase, summary });
        RunReport {
            phase,
            summary,
            items: self.queue.into_items(),
        }
    }
}
