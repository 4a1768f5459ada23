use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::state::{Activity, Transition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub bytes_forwarded: u64,
    pub chunks_forwarded: u64,
    pub transitions: TransitionCounts,
    pub actions: ActionCounts,
    pub final_activity: Activity,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionCounts {
    pub idle_to_active: u64,
    pub active_to_idle: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionCounts {
    pub idle_to_active: u64,
    pub active_to_idle: u64,
    pub eof: u64,
}

impl RunSummary {
    pub fn new(started_at: DateTime<Utc>) -> Self {
        Self {
            started_at,
            ended_at: None,
            bytes_forwarded: 0,
            chunks_forwarded: 0,
            transitions: TransitionCounts::default(),
            actions: ActionCounts::default(),
            final_activity: Activity::Idle,
        }
    }

    pub(crate) fn record_chunk(&mut self, len: usize) {
        self.bytes_forwarded += len as u64;
        self.chunks_forwarded += 1;
    }

    pub(crate) fn record_transition(&mut self, transition: Transition) {
        match transition {
            Transition::IdleToActive => self.transitions.idle_to_active += 1,
            Transition::ActiveToIdle => self.transitions.active_to_idle += 1,
        }
    }

    pub(crate) fn record_action(&mut self, kind: ActionKind) {
        match kind {
            ActionKind::IdleToActive => self.actions.idle_to_active += 1,
            ActionKind::ActiveToIdle => self.actions.active_to_idle += 1,
            ActionKind::Eof => self.actions.eof += 1,
        }
    }
}
