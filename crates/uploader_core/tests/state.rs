use uploader_core::{ItemStatus, Phase, RunConfig, RunState, TransitionError};

fn init_logging() {
    uploader_logging::initialize_for_tests();
}

#[test]
fn happy_path_transitions_are_accepted() {
    init_logging();
    let mut state = RunState::new();
    for phase in [
        Phase::Scheduled,
        Phase::Connecting,
        Phase::Uploading,
        Phase::AwaitingCheckpoint,
        Phase::Uploading,
        Phase::Reconnecting,
        Phase::Uploading,
        Phase::Completed,
    ] {
        state.transition(phase).unwrap();
        log::debug!("phase now {}", state.phase);
    }
    assert!(state.phase.is_terminal());
}

#[test]
fn terminal_phases_are_sticky() {
    for terminal in [Phase::Completed, Phase::Cancelled, Phase::Failed] {
        for next in [Phase::Uploading, Phase::Cancelling, Phase::Failed] {
            assert!(!terminal.can_transition_to(next), "{terminal} -> {next}");
        }
    }
}

#[test]
fn cancelling_is_reachable_from_every_live_phase() {
    for phase in [
        Phase::Idle,
        Phase::Scheduled,
        Phase::Connecting,
        Phase::Uploading,
        Phase::AwaitingCheckpoint,
        Phase::Reconnecting,
    ] {
        assert!(phase.can_transition_to(Phase::Cancelling), "{phase}");
    }
    assert!(!Phase::Cancelling.can_transition_to(Phase::Cancelling));
    assert!(Phase::Cancelling.can_transition_to(Phase::Cancelled));
}

#[test]
fn skipping_connecting_is_rejected() {
    let mut state = RunState::new();
    state.transition(Phase::Scheduled).unwrap();
    assert_eq!(
        state.transition(Phase::Uploading),
        Err(TransitionError::Phase {
            from: Phase::Scheduled,
            to: Phase::Uploading,
        })
    );
    assert_eq!(state.phase, Phase::Scheduled);
}

#[test]
fn checkpoint_is_due_once_at_the_boundary() {
    let config = RunConfig {
        test_batch_size: 2,
        ..RunConfig::default()
    };
    let mut state = RunState::new();
    assert!(!state.checkpoint_due(config.test_batch_size));

    state.record_and_advance(ItemStatus::Succeeded);
    assert!(!state.checkpoint_due(config.test_batch_size));
    state.record_and_advance(ItemStatus::Failed);
    assert!(state.checkpoint_due(config.test_batch_size));

    state.mark_checkpoint();
    assert!(!state.checkpoint_due(config.test_batch_size));
    assert_eq!((state.succeeded, state.failed), (1, 1));
}

#[test]
fn disabled_checkpoint_never_fires() {
    let state = RunState::new();
    assert!(!state.checkpoint_due(0));
    assert!(!RunConfig::default().checkpoint_enabled());
}

#[test]
fn unresolved_statuses_do_not_advance() {
    let mut state = RunState::new();
    state.record_and_advance(ItemStatus::InProgress);
    assert_eq!(state.current_index, 0);
}
