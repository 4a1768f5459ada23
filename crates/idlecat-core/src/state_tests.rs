use std::time::{Duration, Instant};

use crate::config::MonitorConfig;
use crate::state::{evaluate, Activity, MonitorState, Transition};

fn secs(n: u64) -> Duration {
    Duration::from_secs(n)
}

fn config(idle_timeout: u64, idle_to_active: u64, active_to_idle: u64) -> MonitorConfig {
    MonitorConfig {
        idle_timeout: secs(idle_timeout),
        idle_to_active_threshold: secs(idle_to_active),
        active_to_idle_threshold: secs(active_to_idle),
        ..MonitorConfig::default()
    }
}

#[test]
fn starts_idle_with_both_clocks_at_start() {
    let start = Instant::now();

    let state = MonitorState::new(start);

    assert_eq!(state.activity(), Activity::Idle);
    assert_eq!(state.state_entered(), start);
    assert_eq!(state.last_data(), start);
}

#[test]
fn quiet_poll_while_idle_changes_nothing() {
    let start = Instant::now();
    let state = MonitorState::new(start);

    let evaluation = evaluate(&state, start + secs(600), false, &config(5, 120, 180));

    assert_eq!(evaluation.next, state);
    assert!(evaluation.event.is_none());
}

#[test]
fn data_after_short_idle_flips_without_significance() {
    // Arrange
    let start = Instant::now();
    let state = MonitorState::new(start);
    let now = start + secs(1);

    // Act
    let evaluation = evaluate(&state, now, true, &config(1, 2, 2));

    // Assert
    assert_eq!(evaluation.next.activity(), Activity::Active);
    assert_eq!(evaluation.next.state_entered(), now);
    assert_eq!(evaluation.next.last_data(), now);
    let event = evaluation.event.expect("transition");
    assert_eq!(event.transition, Transition::IdleToActive);
    assert_eq!(event.dwell, secs(1));
    assert!(!event.significant);
}

#[test]
fn data_after_long_idle_is_significant() {
    let start = Instant::now();
    let state = MonitorState::new(start);

    let evaluation = evaluate(&state, start + secs(3), true, &config(1, 2, 2));

    let event = evaluation.event.expect("transition");
    assert_eq!(event.transition, Transition::IdleToActive);
    assert!(event.significant);
}

#[test]
fn idle_dwell_equal_to_threshold_is_significant() {
    let start = Instant::now();
    let state = MonitorState::new(start);

    let evaluation = evaluate(&state, start + secs(120), true, &config(5, 120, 180));

    assert!(evaluation.event.expect("transition").significant);
}

#[test]
fn data_while_active_only_refreshes_last_data() {
    // Arrange
    let start = Instant::now();
    let mut state = MonitorState::new(start);
    let cfg = config(5, 120, 180);
    state.advance(start + secs(1), true, &cfg);

    // Act
    let event = state.advance(start + secs(3), true, &cfg);

    // Assert
    assert!(event.is_none());
    assert_eq!(state.activity(), Activity::Active);
    assert_eq!(state.state_entered(), start + secs(1));
    assert_eq!(state.last_data(), start + secs(3));
}

#[test]
fn active_flips_to_idle_exactly_at_timeout() {
    // Arrange
    let start = Instant::now();
    let mut state = MonitorState::new(start);
    let cfg = config(5, 120, 180);
    state.advance(start, true, &cfg);

    // Act
    let before = state.advance(start + Duration::from_millis(4_999), false, &cfg);
    let at = state.advance(start + secs(5), false, &cfg);

    // Assert
    assert!(before.is_none());
    let event = at.expect("timeout reached");
    assert_eq!(event.transition, Transition::ActiveToIdle);
    assert_eq!(event.dwell, secs(5));
    assert!(!event.significant);
    assert_eq!(state.activity(), Activity::Idle);
    assert_eq!(state.state_entered(), start + secs(5));
}

#[test]
fn long_active_period_makes_idle_transition_significant() {
    let start = Instant::now();
    let mut state = MonitorState::new(start);
    let cfg = config(1, 2, 2);
    state.advance(start + secs(1), true, &cfg);
    state.advance(start + secs(2), true, &cfg);
    state.advance(start + secs(3), true, &cfg);

    let event = state.advance(start + secs(4), false, &cfg).expect("went idle");

    assert_eq!(event.transition, Transition::ActiveToIdle);
    assert_eq!(event.dwell, secs(3));
    assert!(event.significant);
}

#[test]
fn flapping_resets_dwell_every_time() {
    // Arrange
    let start = Instant::now();
    let mut state = MonitorState::new(start);
    let cfg = config(1, 2, 2);

    // Act: each idle stretch is shorter than the idle-to-active threshold.
    let mut events = Vec::new();
    for second in 1..=6 {
        let data = second % 2 == 1;
        events.extend(state.advance(start + secs(second), data, &cfg));
    }

    // Assert
    assert_eq!(events.len(), 6);
    assert!(events.iter().all(|event| event.dwell == secs(1)));
    assert!(events.iter().all(|event| !event.significant));
    assert_eq!(state.state_entered(), start + secs(6));
}

#[test]
fn last_data_never_moves_backwards() {
    let start = Instant::now();
    let mut state = MonitorState::new(start);
    let cfg = config(5, 120, 180);
    state.advance(start + secs(4), true, &cfg);

    state.advance(start + secs(2), true, &cfg);

    assert_eq!(state.last_data(), start + secs(4));
}
