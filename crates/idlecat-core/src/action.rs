use std::fmt;
use std::io;
use std::os::fd::AsFd;
use std::process::Stdio;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::config::ActionSet;
use crate::state::Transition;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    IdleToActive,
    ActiveToIdle,
    Eof,
}

impl From<Transition> for ActionKind {
    fn from(transition: Transition) -> Self {
        match transition {
            Transition::IdleToActive => ActionKind::IdleToActive,
            Transition::ActiveToIdle => ActionKind::ActiveToIdle,
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::IdleToActive => fmt::Display::fmt(&Transition::IdleToActive, f),
            ActionKind::ActiveToIdle => fmt::Display::fmt(&Transition::ActiveToIdle, f),
            ActionKind::Eof => f.write_str("eof"),
        }
    }
}

impl ActionSet {
    pub fn command_for(&self, kind: ActionKind) -> Option<&str> {
        match kind {
            ActionKind::IdleToActive => self.idle_to_active.as_deref(),
            ActionKind::ActiveToIdle => self.active_to_idle.as_deref(),
            ActionKind::Eof => self.eof.as_deref(),
        }
    }
}

/// Runs an external command and returns once it has finished.
///
/// Failures stay inside the runner: the monitor never sees an outcome.
#[async_trait]
pub trait ActionRunner: Send {
    async fn run(&mut self, kind: ActionKind, command: &str);
}

/// Runs actions through `sh -c`, like `system(3)`.
///
/// The child gets a null stdin so it cannot consume monitored input, and its
/// stdout goes to our stderr so it never lands in the forwarded stream.
#[derive(Debug, Clone)]
pub struct ShellRunner {
    shell: String,
}

impl ShellRunner {
    pub fn new(shell: impl Into<String>) -> Self {
        Self { shell: shell.into() }
    }
}

impl Default for ShellRunner {
    fn default() -> Self {
        Self::new("/bin/sh")
    }
}

fn stderr_as_stdio() -> io::Result<Stdio> {
    let fd = io::stderr().as_fd().try_clone_to_owned()?;
    Ok(Stdio::from(fd))
}

#[async_trait]
impl ActionRunner for ShellRunner {
    async fn run(&mut self, kind: ActionKind, command: &str) {
        let mut cmd = Command::new(&self.shell);
        cmd.arg("-c").arg(command).stdin(Stdio::null());
        match stderr_as_stdio() {
            Ok(stdio) => {
                cmd.stdout(stdio);
            }
            Err(err) => {
                warn!(action=%kind, error=%err, "cannot duplicate stderr, discarding action output");
                cmd.stdout(Stdio::null());
            }
        }

        match cmd.status().await {
            Ok(status) if status.success() => {
                debug!(action=%kind, "action finished");
            }
            Ok(status) => {
                warn!(action=%kind, %status, command, "action exited unsuccessfully");
            }
            Err(err) => {
                warn!(action=%kind, error=%err, command, "failed to launch action");
            }
        }
    }
}
