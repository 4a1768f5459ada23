pub mod action;
pub mod clock;
pub mod config;
pub mod monitor;
pub mod source;
pub mod state;
pub mod summary;

#[cfg(test)]
mod state_tests;

pub use action::{ActionKind, ActionRunner, ShellRunner};
pub use clock::{Clock, SystemClock};
pub use config::{ActionSet, ConfigError, MonitorConfig};
pub use monitor::Monitor;
pub use source::{raw_stdout, InputSource, PollOutcome, StdinSource, StreamError};
pub use state::{evaluate, Activity, Evaluation, MonitorState, Transition, TransitionEvent};
pub use summary::{ActionCounts, RunSummary, TransitionCounts};
