use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use uploader_core::{LogLevel, ProgressEvent};

use crate::sink::{emit_log, ProgressSink};

/// Start delays longer than this get a keep-the-machine-on warning.
pub const LONG_START_DELAY_MINUTES: u64 = 30;

// Deadlines further out than this are clamped so `Instant` arithmetic
// cannot overflow.
const MAX_COUNTDOWN: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateOutcome {
    Elapsed,
    Cancelled,
}

/// Pre-flight countdown before the first connection attempt.
#[derive(Debug, Clone)]
pub struct ScheduleGate {
    delay: Duration,
    tick: Duration,
}

impl ScheduleGate {
    pub fn new(delay: Duration, tick: Duration) -> Self {
        Self {
            delay,
            tick: tick.max(Duration::from_millis(1)),
        }
    }

    /// Counts down, emitting a `CountdownTick` with the remaining time once per
    /// tick. Returns early when `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken, sink: &dyn ProgressSink) -> GateOutcome {
        if cancel.is_cancelled() {
            return GateOutcome::Cancelled;
        }
        if self.delay.is_zero() {
            return GateOutcome::Elapsed;
        }

        let minutes = self.delay.as_secs() / 60;
        let notice = match start_eta(self.delay) {
            Some(eta) => format!(
                "Upload scheduled to start at {} ({minutes} min)",
                eta.format("%H:%M:%S")
            ),
            None => format!("Upload scheduled to start in {minutes} min"),
        };
        emit_log(sink, LogLevel::Info, notice);
        if minutes > LONG_START_DELAY_MINUTES {
            emit_log(
                sink,
                LogLevel::Warn,
                format!(
                    "Start delay is {minutes} minutes: keep this computer on and connected until then"
                ),
            );
        }

        if count_down(self.delay, self.tick, cancel, sink, |remaining| {
            ProgressEvent::CountdownTick { remaining }
        })
        .await
        {
            GateOutcome::Elapsed
        } else {
            GateOutcome::Cancelled
        }
    }
}

fn start_eta(delay: Duration) -> Option<chrono::DateTime<chrono::Local>> {
    let delay = chrono::Duration::from_std(delay).ok()?;
    chrono::Local::now().checked_add_signed(delay)
}

/// Waits `total`, emitting `tick_event(remaining)` once per `tick`.
/// Returns false when cancelled.
pub(crate) async fn count_down<F>(
    total: Duration,
    tick: Duration,
    cancel: &CancellationToken,
    sink: &dyn ProgressSink,
    tick_event: F,
) -> bool
where
    F: Fn(Duration) -> ProgressEvent,
{
    let tick = tick.max(Duration::from_millis(1));
    let started = Instant::now();
    let deadline = started + total.min(MAX_COUNTDOWN);
    let mut next_tick = started;
    loop {
        if cancel.is_cancelled() {
            return false;
        }
        let now = Instant::now();
        if now >= deadline {
            return true;
        }
        sink.emit(tick_event(deadline - now));
        next_tick += tick;
        let wake = next_tick.min(deadline);
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return false,
            _ = tokio::time::sleep_until(wake) => {}
        }
    }
}

/// Sleeps for `duration` unless `cancel` fires first. Returns false when
/// cancelled.
pub async fn sleep_or_cancel(duration: Duration, cancel: &CancellationToken) -> bool {
    if cancel.is_cancelled() {
        return false;
    }
    if duration.is_zero() {
        return true;
    }
    tokio::select! {
        biased;
        _ = cancel.cancelled() => false,
        _ = tokio::time::sleep(duration) => true,
    }
}
