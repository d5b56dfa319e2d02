//! Terminal front end for a running upload.
//!
//! Renders progress events and turns stdin lines into checkpoint answers
//! or a cancel request.

use std::io::{self, BufRead, Write};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use chrono::Local;
use uploader_core::{CheckpointDecision, LogLevel, ProgressEvent};
use uploader_engine::{EngineError, RunReport, UploadHandle};

const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// What a line typed by the user means in the current context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserInput {
    Answer(CheckpointDecision),
    Cancel,
    Ignored,
}

/// Interprets one stdin line. While a checkpoint is pending only yes/no
/// answers count; anything other than yes aborts. Otherwise `stop`, `quit`
/// or `q` request cancellation.
pub fn interpret_line(line: &str, awaiting_checkpoint: bool) -> UserInput {
    let word = line.trim().to_ascii_lowercase();
    if awaiting_checkpoint {
        return match word.as_str() {
            "y" | "yes" | "c" | "continue" => UserInput::Answer(CheckpointDecision::Continue),
            "" => UserInput::Ignored,
            _ => UserInput::Answer(CheckpointDecision::Abort),
        };
    }
    match word.as_str() {
        "stop" | "quit" | "q" | "cancel" => UserInput::Cancel,
        _ => UserInput::Ignored,
    }
}

/// Formats a remaining duration as `MMm SSs` (or `HHh MMm SSs`).
pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    let (hours, minutes, seconds) = (total / 3600, (total % 3600) / 60, total % 60);
    if hours > 0 {
        format!("{hours:02}h {minutes:02}m {seconds:02}s")
    } else {
        format!("{minutes:02}m {seconds:02}s")
    }
}

/// Text for a countdown tick, drawn in place over the previous one.
/// Returns `None` for every other event.
pub fn render_tick(event: &ProgressEvent, total: usize) -> Option<String> {
    match event {
        ProgressEvent::CountdownTick { remaining } => {
            Some(format!("Starting in {}", format_countdown(*remaining)))
        }
        ProgressEvent::DelayTick {
            remaining,
            next_index,
        } => Some(format!(
            "Next file ({}/{total}) in {}",
            next_index + 1,
            format_countdown(*remaining)
        )),
        _ => None,
    }
}

/// Renders one event as a line of text. Countdown ticks and item starts
/// return `None`; they are covered by log lines or drawn in place.
pub fn render_event(event: &ProgressEvent, total: usize) -> Option<String> {
    let stamp = Local::now().format("%H:%M:%S");
    let line = match event {
        ProgressEvent::Log { level, message } => match level {
            LogLevel::Debug => return None,
            LogLevel::Info => format!("[{stamp}] {message}"),
            LogLevel::Warn => format!("[{stamp}] WARNING: {message}"),
            LogLevel::Error => format!("[{stamp}] ERROR: {message}"),
        },
        ProgressEvent::ItemFinished { item, outcome } => format!(
            "[{stamp}] ({}/{total}) {}: {outcome}",
            item.index + 1,
            item.file_name()
        ),
        ProgressEvent::CheckpointReached { uploaded_so_far } => format!(
            "[{stamp}] Test batch of {uploaded_so_far} file(s) done. \
             Check the server, then type 'y' to continue or 'n' to stop:"
        ),
        ProgressEvent::ReconnectAttempt { attempt } => {
            format!("[{stamp}] Reconnect attempt {attempt}")
        }
        ProgressEvent::RunEnded { phase, summary } => {
            format!("[{stamp}] Finished ({phase}): {summary}")
        }
        ProgressEvent::PhaseChanged(_)
        | ProgressEvent::CountdownTick { .. }
        | ProgressEvent::DelayTick { .. }
        | ProgressEvent::ConnectionEstablished { .. }
        | ProgressEvent::ItemStarted(_) => return None,
    };
    Some(line)
}

fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel();
    // Detached: a blocked read must not keep the process alive.
    let _ = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    rx
}

/// Drives a started run to completion, printing progress and forwarding
/// user answers. Returns the final report.
pub fn follow_run(handle: UploadHandle, total: usize, json: bool) -> Result<RunReport, EngineError> {
    let input = spawn_stdin_reader();
    let mut awaiting_checkpoint = false;
    let mut countdown_shown = false;
    let stdout = io::stdout();

    if !json {
        println!("Type 'stop' and press Enter to cancel the run.");
    }

    loop {
        match handle.recv_timeout(POLL_INTERVAL) {
            Some(event) => {
                let mut out = stdout.lock();
                if json {
                    if let Ok(line) = serde_json::to_string(&event) {
                        let _ = writeln!(out, "{line}");
                    }
                } else if let Some(tick) = render_tick(&event, total) {
                    let _ = write!(out, "\r{tick}   ");
                    let _ = out.flush();
                    countdown_shown = true;
                } else if let Some(line) = render_event(&event, total) {
                    if countdown_shown {
                        let _ = writeln!(out);
                        countdown_shown = false;
                    }
                    let _ = writeln!(out, "{line}");
                }
                match event {
                    ProgressEvent::CheckpointReached { .. } => awaiting_checkpoint = true,
                    ProgressEvent::RunEnded { .. } => break,
                    _ => {}
                }
            }
            None if handle.is_finished() => break,
            None => {}
        }

        while let Ok(line) = input.try_recv() {
            match interpret_line(&line, awaiting_checkpoint) {
                UserInput::Answer(decision) => {
                    handle.resolve_checkpoint(decision);
                    awaiting_checkpoint = false;
                }
                UserInput::Cancel => handle.cancel(),
                UserInput::Ignored => {}
            }
        }
    }

    handle.wait()
}

/// Asks a yes/no question on stdin. Anything but yes is a no.
pub fn confirm(question: &str) -> bool {
    print!("{question} [y/N] ");
    let _ = io::stdout().flush();
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}
