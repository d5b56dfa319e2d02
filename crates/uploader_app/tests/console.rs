use std::path::PathBuf;
use std::time::Duration;

use pretty_assertions::assert_eq;
use uploader_app::console::{
    format_countdown, interpret_line, render_event, render_tick, UserInput,
};
use uploader_core::{
    CheckpointDecision, ItemOutcome, ItemStatus, LogLevel, ProgressEvent, TransferItem,
};

#[test]
fn checkpoint_answers_default_to_abort() {
    assert_eq!(
        interpret_line("Y\n", true),
        UserInput::Answer(CheckpointDecision::Continue)
    );
    assert_eq!(
        interpret_line("yes", true),
        UserInput::Answer(CheckpointDecision::Continue)
    );
    assert_eq!(
        interpret_line("n", true),
        UserInput::Answer(CheckpointDecision::Abort)
    );
    assert_eq!(
        interpret_line("whatever", true),
        UserInput::Answer(CheckpointDecision::Abort)
    );
    assert_eq!(interpret_line("   ", true), UserInput::Ignored);
}

#[test]
fn stop_words_cancel_outside_checkpoint() {
    assert_eq!(interpret_line("stop", false), UserInput::Cancel);
    assert_eq!(interpret_line(" Q ", false), UserInput::Cancel);
    assert_eq!(interpret_line("y", false), UserInput::Ignored);
}

#[test]
fn countdown_formats_minutes_and_hours() {
    assert_eq!(format_countdown(Duration::from_secs(65)), "01m 05s");
    assert_eq!(format_countdown(Duration::from_secs(0)), "00m 00s");
    assert_eq!(format_countdown(Duration::from_secs(3 * 3600 + 61)), "03h 01m 01s");
}

#[test]
fn renders_finished_items_and_levels() {
    let item = TransferItem {
        index: 1,
        local_path: PathBuf::from("/data/file_02.csv"),
        remote_path: "/incoming/file_02.csv".to_string(),
        status: ItemStatus::Failed,
    };
    let line = render_event(
        &ProgressEvent::ItemFinished {
            item,
            outcome: ItemOutcome::Failed {
                reason: "permission denied".into(),
            },
        },
        5,
    )
    .unwrap();
    assert!(
        line.ends_with("(2/5) file_02.csv: failed: permission denied"),
        "{line}"
    );

    let warn = render_event(
        &ProgressEvent::Log {
            level: LogLevel::Warn,
            message: "slow".into(),
        },
        5,
    )
    .unwrap();
    assert!(warn.ends_with("WARNING: slow"), "{warn}");

    assert_eq!(
        render_event(
            &ProgressEvent::CountdownTick {
                remaining: Duration::from_secs(1)
            },
            5
        ),
        None
    );
}

#[test]
fn both_countdowns_are_drawn_in_place() {
    let start = ProgressEvent::CountdownTick {
        remaining: Duration::from_secs(125),
    };
    assert_eq!(render_tick(&start, 4).as_deref(), Some("Starting in 02m 05s"));

    let between = ProgressEvent::DelayTick {
        remaining: Duration::from_secs(9),
        next_index: 2,
    };
    assert_eq!(render_tick(&between, 4).as_deref(), Some("Next file (3/4) in 00m 09s"));
    assert_eq!(render_event(&between, 4), None);

    let log = ProgressEvent::Log {
        level: LogLevel::Info,
        message: "Connected".into(),
    };
    assert_eq!(render_tick(&log, 4), None);
}
