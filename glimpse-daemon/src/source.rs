//! Log stream subscriptions.
//!
//! A [`LogSource`] yields lines in emission order. `Ok(None)` means the
//! stream ended; for the daemon that is fatal.

use std::process::Stdio;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tokio::process::{Child, ChildStdout, Command};
use tokio::sync::mpsc;

use crate::error::{io_err, DaemonError};

#[allow(async_fn_in_trait)]
pub trait LogSource {
    /// Wait for the next line. Trailing `\n` / `\r\n` are stripped.
    async fn next_line(&mut self) -> Result<Option<String>, DaemonError>;
}

// ---------------------------------------------------------------------------
// Reader
// ---------------------------------------------------------------------------

/// Lines from any buffered async reader. Invalid UTF-8 is replaced rather
/// than treated as a read error.
pub struct ReaderLogSource<R> {
    reader: R,
    label: String,
    buf: Vec<u8>,
}

impl<R: AsyncBufRead + Unpin> ReaderLogSource<R> {
    pub fn new(reader: R, label: impl Into<String>) -> Self {
        Self {
            reader,
            label: label.into(),
            buf: Vec::new(),
        }
    }
}

impl<R: AsyncBufRead + Unpin> LogSource for ReaderLogSource<R> {
    async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        self.buf.clear();
        let read = self
            .reader
            .read_until(b'\n', &mut self.buf)
            .await
            .map_err(|e| io_err(&self.label, e))?;
        if read == 0 {
            return Ok(None);
        }
        if self.buf.last() == Some(&b'\n') {
            self.buf.pop();
            if self.buf.last() == Some(&b'\r') {
                self.buf.pop();
            }
        }
        Ok(Some(String::from_utf8_lossy(&self.buf).into_owned()))
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

/// Stdout of a long-running follower process such as `journalctl -f`.
/// The process is killed when the source is dropped.
pub struct CommandLogSource {
    child: Child,
    lines: ReaderLogSource<BufReader<ChildStdout>>,
}

impl CommandLogSource {
    pub fn spawn(command: &[String]) -> Result<Self, DaemonError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| DaemonError::Command("log source command is empty".to_string()))?;

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| io_err(program, e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| DaemonError::Runtime("log source stdout not captured".to_string()))?;

        tracing::info!(command = %command.join(" "), pid = ?child.id(), "log source started");
        Ok(Self {
            child,
            lines: ReaderLogSource::new(BufReader::new(stdout), program.clone()),
        })
    }
}

impl LogSource for CommandLogSource {
    async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        let line = self.lines.next_line().await?;
        if line.is_none() {
            match self.child.try_wait() {
                Ok(Some(status)) => tracing::error!(%status, "log source process exited"),
                Ok(None) => tracing::error!("log source closed stdout but is still running"),
                Err(err) => tracing::error!(error = %err, "log source status unavailable"),
            }
        }
        Ok(line)
    }
}

// ---------------------------------------------------------------------------
// Channel
// ---------------------------------------------------------------------------

/// Lines pushed by another task. The stream ends when every sender is dropped.
pub struct ChannelLogSource {
    rx: mpsc::Receiver<String>,
}

impl ChannelLogSource {
    pub fn new(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }
}

impl LogSource for ChannelLogSource {
    async fn next_line(&mut self) -> Result<Option<String>, DaemonError> {
        Ok(self.rx.recv().await)
    }
}
