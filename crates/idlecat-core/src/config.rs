use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_IDLE_TO_ACTIVE_THRESHOLD_SECS: u64 = 2 * 60;
pub const DEFAULT_ACTIVE_TO_IDLE_THRESHOLD_SECS: u64 = 3 * 60;
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("idle timeout must be positive")]
    IdleTimeout,
    #[error("idle to active threshold must be positive")]
    IdleToActiveThreshold,
    #[error("active to idle threshold must be positive")]
    ActiveToIdleThreshold,
    #[error("poll interval must be positive")]
    PollInterval,
    #[error("buffer size must be positive")]
    BufferSize,
}

/// Commands run on transitions and end-of-stream. `None` means no side effect.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionSet {
    pub idle_to_active: Option<String>,
    pub active_to_idle: Option<String>,
    pub eof: Option<String>,
}

#[derive(Debug, Clone)]
pub struct MonitorConfig {
    /// Silence after which an active stream counts as idle.
    pub idle_timeout: Duration,
    /// Idle dwell required before the idle-to-active action fires.
    pub idle_to_active_threshold: Duration,
    /// Active dwell required before the active-to-idle action fires.
    pub active_to_idle_threshold: Duration,
    /// Upper bound on a single readiness wait.
    pub poll_interval: Duration,
    pub buffer_size: usize,
    pub actions: ActionSet,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            idle_timeout: Duration::from_secs(DEFAULT_IDLE_TIMEOUT_SECS),
            idle_to_active_threshold: Duration::from_secs(DEFAULT_IDLE_TO_ACTIVE_THRESHOLD_SECS),
            active_to_idle_threshold: Duration::from_secs(DEFAULT_ACTIVE_TO_IDLE_THRESHOLD_SECS),
            poll_interval: Duration::from_secs(1),
            buffer_size: DEFAULT_BUFFER_SIZE,
            actions: ActionSet::default(),
        }
    }
}

impl MonitorConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.idle_timeout.is_zero() {
            return Err(ConfigError::IdleTimeout);
        }
        if self.idle_to_active_threshold.is_zero() {
            return Err(ConfigError::IdleToActiveThreshold);
        }
        if self.active_to_idle_threshold.is_zero() {
            return Err(ConfigError::ActiveToIdleThreshold);
        }
        if self.poll_interval.is_zero() {
            return Err(ConfigError::PollInterval);
        }
        if self.buffer_size == 0 {
            return Err(ConfigError::BufferSize);
        }
        Ok(())
    }
}
