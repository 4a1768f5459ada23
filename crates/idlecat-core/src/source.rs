use std::fs::File;
use std::io::{self, Read, Write};
use std::os::fd::{AsFd, AsRawFd, OwnedFd};
use std::time::Duration;

use async_trait::async_trait;
use nix::fcntl::{fcntl, FcntlArg, OFlag};
use thiserror::Error;
use tokio::io::unix::AsyncFd;
use tokio::time::timeout;
use tracing::debug;

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("stream setup failed: {0}")]
    Setup(#[source] io::Error),
    #[error("waiting for input failed: {0}")]
    Wait(#[source] io::Error),
    #[error("read failed: {0}")]
    Read(#[source] io::Error),
    #[error("write failed: {0}")]
    Write(#[source] io::Error),
}

/// Result of one bounded wait-then-read attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// Nothing became readable within the wait.
    TimedOut,
    /// Readiness was reported but the read would have blocked.
    WouldBlock,
    Data(usize),
    Eof,
}

#[async_trait]
pub trait InputSource: Send {
    /// Waits up to `wait` for input, then reads at most `buf.len()` bytes.
    async fn poll_read(&mut self, buf: &mut [u8], wait: Duration) -> Result<PollOutcome, StreamError>;
}

enum Registration {
    Reactor(AsyncFd<File>),
    /// Descriptors epoll refuses (regular files, `/dev/null`) are always
    /// readable, same as `select(2)` reports them.
    AlwaysReady(File),
}

/// Standard input, switched to non-blocking mode.
///
/// Reads go straight to the descriptor so no bytes are held back in a
/// userspace buffer while the descriptor itself reports not-ready.
pub struct StdinSource {
    registration: Registration,
}

impl StdinSource {
    /// Must be called from within a tokio runtime.
    pub fn new() -> Result<Self, StreamError> {
        let fd = io::stdin()
            .as_fd()
            .try_clone_to_owned()
            .map_err(StreamError::Setup)?;
        set_nonblocking(&fd).map_err(StreamError::Setup)?;

        let registration = match AsyncFd::try_new(File::from(fd)) {
            Ok(async_fd) => Registration::Reactor(async_fd),
            Err(err) => {
                let (file, cause) = err.into_parts();
                debug!(error=%cause, "stdin cannot be registered for readiness, treating as always readable");
                Registration::AlwaysReady(file)
            }
        };

        Ok(Self { registration })
    }
}

fn set_nonblocking(fd: &OwnedFd) -> io::Result<()> {
    let raw = fd.as_raw_fd();
    let flags = OFlag::from_bits_truncate(fcntl(raw, FcntlArg::F_GETFL)?);
    fcntl(raw, FcntlArg::F_SETFL(flags | OFlag::O_NONBLOCK))?;
    Ok(())
}

fn classify_read(result: io::Result<usize>) -> Result<PollOutcome, StreamError> {
    match result {
        Ok(0) => Ok(PollOutcome::Eof),
        Ok(n) => Ok(PollOutcome::Data(n)),
        // Reads are not retried here; the next iteration polls again.
        Err(err) if matches!(err.kind(), io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted) => {
            Ok(PollOutcome::WouldBlock)
        }
        Err(err) => Err(StreamError::Read(err)),
    }
}

#[async_trait]
impl InputSource for StdinSource {
    async fn poll_read(&mut self, buf: &mut [u8], wait: Duration) -> Result<PollOutcome, StreamError> {
        match &mut self.registration {
            Registration::Reactor(async_fd) => {
                let mut guard = match timeout(wait, async_fd.readable_mut()).await {
                    Err(_elapsed) => return Ok(PollOutcome::TimedOut),
                    Ok(ready) => ready.map_err(StreamError::Wait)?,
                };
                match guard.try_io(|inner| inner.get_mut().read(buf)) {
                    Ok(result) => classify_read(result),
                    Err(_would_block) => Ok(PollOutcome::WouldBlock),
                }
            }
            Registration::AlwaysReady(file) => classify_read(file.read(buf)),
        }
    }
}

/// Standard output as an unbuffered file, so every chunk reaches the
/// descriptor before the loop moves on.
pub fn raw_stdout() -> Result<File, StreamError> {
    let fd = io::stdout()
        .as_fd()
        .try_clone_to_owned()
        .map_err(StreamError::Setup)?;
    Ok(File::from(fd))
}

/// Writes the whole chunk, retrying partial and interrupted writes.
pub fn forward<W: Write + ?Sized>(out: &mut W, chunk: &[u8]) -> Result<(), StreamError> {
    let mut pending = chunk;
    while !pending.is_empty() {
        match out.write(pending) {
            Ok(0) => {
                return Err(StreamError::Write(io::Error::from(io::ErrorKind::WriteZero)));
            }
            Ok(n) => pending = &pending[n..],
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Write(err)),
        }
    }
    loop {
        match out.flush() {
            Ok(()) => return Ok(()),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(StreamError::Write(err)),
        }
    }
}
