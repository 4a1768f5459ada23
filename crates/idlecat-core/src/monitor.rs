use std::io::Write;

use chrono::Utc;
use tracing::{debug, info};

use crate::action::{ActionKind, ActionRunner};
use crate::clock::Clock;
use crate::config::{ConfigError, MonitorConfig};
use crate::source::{forward, InputSource, PollOutcome, StreamError};
use crate::state::{Activity, MonitorState, TransitionEvent};
use crate::summary::RunSummary;

/// Forwards input to output while classifying the stream as idle or active.
///
/// Single-threaded: actions run to completion before the next read, so an
/// idle-to-active action always finishes before any later chunk is written.
pub struct Monitor<S: InputSource, A: ActionRunner, C: Clock> {
    source: S,
    runner: A,
    clock: C,
    config: MonitorConfig,
    state: MonitorState,
    finished: bool,
    buf: Vec<u8>,
    summary: RunSummary,
}

impl<S: InputSource, A: ActionRunner, C: Clock> Monitor<S, A, C> {
    /// Rejects configurations that fail [`MonitorConfig::validate`].
    pub fn new(source: S, runner: A, clock: C, config: MonitorConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let state = MonitorState::new(clock.now());
        let buf = vec![0_u8; config.buffer_size];
        Ok(Self {
            source,
            runner,
            clock,
            config,
            state,
            finished: false,
            buf,
            summary: RunSummary::new(Utc::now()),
        })
    }

    pub fn activity(&self) -> Activity {
        self.state.activity()
    }

    pub fn state(&self) -> &MonitorState {
        &self.state
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn into_parts(self) -> (S, A, C) {
        (self.source, self.runner, self.clock)
    }

    /// Runs until end-of-stream, or until the first fatal I/O error.
    pub async fn run<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<RunSummary, StreamError> {
        while !self.finished {
            self.tick(out).await?;
        }
        Ok(self.summary.clone())
    }

    /// One loop iteration: bounded wait, forward, then state evaluation.
    /// Does nothing once end-of-stream has been seen.
    pub async fn tick<W: Write + ?Sized>(&mut self, out: &mut W) -> Result<(), StreamError> {
        if self.finished {
            return Ok(());
        }

        let outcome = self
            .source
            .poll_read(&mut self.buf, self.config.poll_interval)
            .await?;
        let now = self.clock.now();

        let data_arrived = match outcome {
            PollOutcome::Data(n) => {
                forward(out, &self.buf[..n])?;
                self.summary.record_chunk(n);
                debug!(bytes = n, "forwarded chunk");
                true
            }
            PollOutcome::Eof => {
                self.finish().await;
                return Ok(());
            }
            PollOutcome::WouldBlock | PollOutcome::TimedOut => false,
        };

        if let Some(event) = self.state.advance(now, data_arrived, &self.config) {
            self.on_transition(event).await;
        }
        self.summary.final_activity = self.state.activity();

        Ok(())
    }

    async fn on_transition(&mut self, event: TransitionEvent) {
        self.summary.record_transition(event.transition);
        info!(
            transition=%event.transition,
            dwell_ms = event.dwell.as_millis() as u64,
            significant = event.significant,
            "activity changed"
        );
        if event.significant {
            self.invoke(ActionKind::from(event.transition)).await;
        }
    }

    async fn finish(&mut self) {
        self.finished = true;
        self.summary.ended_at = Some(Utc::now());
        self.summary.final_activity = self.state.activity();
        info!(
            bytes = self.summary.bytes_forwarded,
            activity=%self.state.activity(),
            "end of stream"
        );
        self.invoke(ActionKind::Eof).await;
    }

    async fn invoke(&mut self, kind: ActionKind) {
        let Some(command) = self.config.actions.command_for(kind) else {
            return;
        };
        info!(action=%kind, command, "running action");
        self.runner.run(kind, command).await;
        self.summary.record_action(kind);
    }
}
