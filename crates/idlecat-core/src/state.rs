//! Idle/active classification.
//!
//! Transitions always happen as soon as their condition holds. The
//! significance thresholds only decide whether the notification for leaving
//! a state is worth firing, measured as the dwell time in that state.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::MonitorConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Activity {
    Idle,
    Active,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Activity::Idle => f.write_str("idle"),
            Activity::Active => f.write_str("active"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Transition {
    IdleToActive,
    ActiveToIdle,
}

impl fmt::Display for Transition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transition::IdleToActive => f.write_str("idle_to_active"),
            Transition::ActiveToIdle => f.write_str("active_to_idle"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionEvent {
    pub transition: Transition,
    /// Time spent in the state being left.
    pub dwell: Duration,
    /// Whether `dwell` reached the threshold for this transition.
    pub significant: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonitorState {
    activity: Activity,
    state_entered: Instant,
    last_data: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub next: MonitorState,
    pub event: Option<TransitionEvent>,
}

impl MonitorState {
    pub fn new(now: Instant) -> Self {
        Self {
            activity: Activity::Idle,
            state_entered: now,
            last_data: now,
        }
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn state_entered(&self) -> Instant {
        self.state_entered
    }

    pub fn last_data(&self) -> Instant {
        self.last_data
    }

    fn enter(&mut self, activity: Activity, now: Instant) {
        self.activity = activity;
        self.state_entered = now;
    }

    /// Applies one loop iteration in place and returns the transition, if any.
    pub fn advance(
        &mut self,
        now: Instant,
        data_arrived: bool,
        config: &MonitorConfig,
    ) -> Option<TransitionEvent> {
        let evaluation = evaluate(self, now, data_arrived, config);
        *self = evaluation.next;
        evaluation.event
    }
}

/// Evaluates one loop iteration observed at `now`.
///
/// At most one transition can result: data arriving while idle moves to
/// active and refreshes `last_data`, which keeps the idle check from firing
/// in the same iteration. This relies on a positive `idle_timeout`, which
/// [`MonitorConfig::validate`] guarantees and `Monitor::new` enforces.
pub fn evaluate(
    state: &MonitorState,
    now: Instant,
    data_arrived: bool,
    config: &MonitorConfig,
) -> Evaluation {
    let mut next = *state;
    let mut event = None;

    if data_arrived {
        if next.activity == Activity::Idle {
            let dwell = now.saturating_duration_since(next.state_entered);
            event = Some(TransitionEvent {
                transition: Transition::IdleToActive,
                dwell,
                significant: dwell >= config.idle_to_active_threshold,
            });
            next.enter(Activity::Active, now);
        }
        if now > next.last_data {
            next.last_data = now;
        }
    }

    let since_data = now.saturating_duration_since(next.last_data);
    if next.activity == Activity::Active && since_data >= config.idle_timeout {
        let dwell = now.saturating_duration_since(next.state_entered);
        event = Some(TransitionEvent {
            transition: Transition::ActiveToIdle,
            dwell,
            significant: dwell >= config.active_to_idle_threshold,
        });
        next.enter(Activity::Idle, now);
    }

    Evaluation { next, event }
}
