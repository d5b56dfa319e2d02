#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use uploader_core::{AuthMode, ConnectionSpec, ProgressEvent, TransferItem, TransferQueue};
use uploader_engine::{
    ConnectError, EngineSettings, ProtocolClient, ProtocolSession, ReconnectPolicy, UploadError,
    UploadHandle,
};

/// What the fake server does to one upload attempt.
#[derive(Debug, Clone)]
pub enum Fault {
    /// Fails the upload and kills the connection.
    Drop,
    /// Fails the upload; the connection stays usable.
    Reject(UploadError),
    /// Succeeds, but only after this long.
    Slow(Duration),
    /// Succeeds, then the server drops the idle connection.
    DieAfter,
}

#[derive(Default)]
struct ServerState {
    connect_results: VecDeque<Result<(), ConnectError>>,
    connects: usize,
    closes: usize,
    alive: bool,
    uploads: Vec<usize>,
    attempts: HashMap<usize, u32>,
    faults: HashMap<(usize, u32), Fault>,
}

/// In-memory stand-in for an SFTP server.
#[derive(Clone, Default)]
pub struct ScriptedServer {
    state: Arc<Mutex<ServerState>>,
}

impl ScriptedServer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues connect outcomes; once drained, connects succeed.
    pub fn connect_results(self, results: Vec<Result<(), ConnectError>>) -> Self {
        self.state.lock().unwrap().connect_results = results.into();
        self
    }

    /// Injects `fault` into the `attempt`-th (1-based) upload of item `index`.
    pub fn fault(self, index: usize, attempt: u32, fault: Fault) -> Self {
        self.state
            .lock()
            .unwrap()
            .faults
            .insert((index, attempt), fault);
        self
    }

    pub fn uploads(&self) -> Vec<usize> {
        self.state.lock().unwrap().uploads.clone()
    }

    pub fn connects(&self) -> usize {
        self.state.lock().unwrap().connects
    }

    pub fn closes(&self) -> usize {
        self.state.lock().unwrap().closes
    }

    pub fn client(&self) -> Arc<dyn ProtocolClient> {
        Arc::new(self.clone())
    }
}

#[async_trait::async_trait]
impl ProtocolClient for ScriptedServer {
    async fn connect(
        &self,
        _spec: &ConnectionSpec,
    ) -> Result<Box<dyn ProtocolSession>, ConnectError> {
        let mut state = self.state.lock().unwrap();
        if let Some(Err(err)) = state.connect_results.pop_front() {
            return Err(err);
        }
        state.connects += 1;
        state.alive = true;
        Ok(Box::new(ScriptedSession {
            state: Arc::clone(&self.state),
        }))
    }
}

struct ScriptedSession {
    state: Arc<Mutex<ServerState>>,
}

#[async_trait::async_trait]
impl ProtocolSession for ScriptedSession {
    fn remote_home(&self) -> Option<String> {
        Some("/home/ops".to_string())
    }

    async fn upload(&mut self, item: &TransferItem) -> Result<(), UploadError> {
        let fault = {
            let mut state = self.state.lock().unwrap();
            if !state.alive {
                return Err(UploadError::Remote("not connected".into()));
            }
            state.uploads.push(item.index);
            let attempt = {
                let count = state.attempts.entry(item.index).or_insert(0);
                *count += 1;
                *count
            };
            state.faults.get(&(item.index, attempt)).cloned()
        };
        match fault {
            Some(Fault::Drop) => {
                self.state.lock().unwrap().alive = false;
                Err(UploadError::Remote("broken pipe".into()))
            }
            Some(Fault::Reject(err)) => Err(err),
            Some(Fault::Slow(duration)) => {
                tokio::time::sleep(duration).await;
                Ok(())
            }
            Some(Fault::DieAfter) => {
                self.state.lock().unwrap().alive = false;
                Ok(())
            }
            None => Ok(()),
        }
    }

    async fn is_alive(&mut self) -> bool {
        self.state.lock().unwrap().alive
    }

    async fn close(&mut self) {
        self.state.lock().unwrap().closes += 1;
    }
}

pub fn spec() -> ConnectionSpec {
    ConnectionSpec::new(
        "sftp.example.com",
        "ops",
        AuthMode::Password {
            password: "secret".into(),
        },
    )
    .with_remote_dir("/incoming")
}

/// Creates `count` local files and queues them in order.
pub fn local_queue(dir: &TempDir, count: usize) -> TransferQueue {
    let paths: Vec<_> = (0..count)
        .map(|i| {
            let path = dir.path().join(format!("file_{i:02}.csv"));
            fs::write(&path, format!("row,{i}\n")).unwrap();
            path
        })
        .collect();
    TransferQueue::from_paths(paths, "/incoming")
}

pub fn fast_settings() -> EngineSettings {
    EngineSettings {
        countdown_tick: Duration::from_millis(10),
        connect_timeout: Duration::from_secs(5),
        liveness_timeout: Duration::from_secs(1),
        idle_check_threshold: Duration::from_secs(3600),
        reconnect: ReconnectPolicy {
            max_attempts: 3,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(20),
        },
    }
}

/// Waits for the next event, failing the test if none arrives.
pub fn next_event(handle: &UploadHandle) -> ProgressEvent {
    handle
        .recv_timeout(Duration::from_secs(10))
        .expect("event within timeout")
}

/// Collects events up to and including `RunEnded`.
pub fn drain(handle: &UploadHandle) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(handle);
        let done = event.is_terminal();
        events.push(event);
        if done {
            return events;
        }
    }
}

/// Collects events until `pred` matches, returning everything seen.
pub fn drain_until(
    handle: &UploadHandle,
    pred: impl Fn(&ProgressEvent) -> bool,
) -> Vec<ProgressEvent> {
    let mut events = Vec::new();
    loop {
        let event = next_event(handle);
        let hit = pred(&event);
        events.push(event);
        if hit {
            return events;
        }
    }
}

pub fn finished_indices(events: &[ProgressEvent]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::ItemFinished { item, .. } => Some(item.index),
            _ => None,
        })
        .collect()
}

pub fn reconnect_attempts(events: &[ProgressEvent]) -> Vec<u32> {
    events
        .iter()
        .filter_map(|event| match event {
            ProgressEvent::ReconnectAttempt { attempt } => Some(*attempt),
            _ => None,
        })
        .collect()
}
