//! External capture action under a hard deadline.
//!
//! The command template comes from config; `{device}` and `{output}` are
//! substituted in every argument. Normal failure modes (timeout, non-zero
//! exit, missing output) are reported as [`CaptureOutcome`] values.
//!
//! Each invocation runs in its own process group. A failed attempt kills the
//! whole group, so helpers forked by a wrapper script cannot write the output
//! file after the attempt has been discarded.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use nix::errno::Errno;
use nix::sys::signal::{killpg, Signal};
use nix::unistd::Pid;
use tokio::process::Command;
use tokio::time::Instant;

use glimpse_core::config::{DEVICE_PLACEHOLDER, OUTPUT_PLACEHOLDER};
use glimpse_core::CaptureConfig;

use crate::error::DaemonError;

const STDERR_EXCERPT_CHARS: usize = 512;

/// Result of one capture attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Exited zero before the deadline and the output file exists.
    Success { path: PathBuf, elapsed: Duration },
    /// Deadline hit; the process was killed.
    TimedOut { after: Duration },
    ExitedNonZero { code: Option<i32>, stderr: String },
    /// Exited zero but produced no file.
    MissingOutput { path: PathBuf },
    SpawnFailed { program: String, error: String },
}

impl CaptureOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, CaptureOutcome::Success { .. })
    }

    /// Short label for structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CaptureOutcome::Success { .. } => "success",
            CaptureOutcome::TimedOut { .. } => "timed_out",
            CaptureOutcome::ExitedNonZero { .. } => "exited_non_zero",
            CaptureOutcome::MissingOutput { .. } => "missing_output",
            CaptureOutcome::SpawnFailed { .. } => "spawn_failed",
        }
    }
}

/// Runs the configured capture command.
#[derive(Debug, Clone)]
pub struct CaptureInvoker {
    program: String,
    args: Vec<String>,
    device: String,
    timeout: Duration,
}

impl CaptureInvoker {
    pub fn new(
        command: &[String],
        device: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, DaemonError> {
        let (program, args) = command
            .split_first()
            .ok_or_else(|| DaemonError::Command("capture command is empty".to_string()))?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            device: device.into(),
            timeout,
        })
    }

    pub fn from_config(config: &CaptureConfig) -> Result<Self, DaemonError> {
        Self::new(&config.command, config.device.clone(), config.timeout())
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Template arguments with placeholders filled in for `output`.
    pub fn render_args(&self, output: &Path) -> Vec<String> {
        let output = output.display().to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace(DEVICE_PLACEHOLDER, &self.device)
                    .replace(OUTPUT_PLACEHOLDER, &output)
            })
            .collect()
    }

    /// Run once, writing to `output`. Blocks the caller until the process
    /// exits or the deadline passes, whichever is first.
    pub async fn capture(&self, output: &Path) -> CaptureOutcome {
        let started = Instant::now();
        let mut command = Command::new(&self.program);
        command
            .args(self.render_args(output))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .process_group(0)
            .kill_on_drop(true);

        let child = match command.spawn() {
            Ok(child) => child,
            Err(err) => {
                return CaptureOutcome::SpawnFailed {
                    program: self.program.clone(),
                    error: err.to_string(),
                }
            }
        };

        let group = child.id();

        // Dropping the wait future on timeout drops the child, which kills it.
        let output_result = match tokio::time::timeout(self.timeout, child.wait_with_output()).await
        {
            Ok(result) => result,
            Err(_) => {
                kill_group(group);
                return CaptureOutcome::TimedOut {
                    after: self.timeout,
                }
            }
        };

        let finished = match output_result {
            Ok(finished) => finished,
            Err(err) => {
                kill_group(group);
                return CaptureOutcome::SpawnFailed {
                    program: self.program.clone(),
                    error: format!("waiting for capture process: {err}"),
                }
            }
        };

        if !finished.status.success() {
            kill_group(group);
            return CaptureOutcome::ExitedNonZero {
                code: finished.status.code(),
                stderr: stderr_excerpt(&finished.stderr),
            };
        }
        if !output.exists() {
            kill_group(group);
            return CaptureOutcome::MissingOutput {
                path: output.to_path_buf(),
            };
        }
        CaptureOutcome::Success {
            path: output.to_path_buf(),
            elapsed: started.elapsed(),
        }
    }
}

/// SIGKILL every process left in the capture's group. The group id is the
/// leader's pid; an already-empty group is not an error.
fn kill_group(group: Option<u32>) {
    let Some(pid) = group.and_then(|pid| i32::try_from(pid).ok()) else {
        return;
    };
    match killpg(Pid::from_raw(pid), Signal::SIGKILL) {
        Ok(()) | Err(Errno::ESRCH) => {}
        Err(err) => tracing::warn!(pgid = pid, error = %err, "could not kill capture process group"),
    }
}

fn stderr_excerpt(stderr: &[u8]) -> String {
    let text = String::from_utf8_lossy(stderr);
    let text = text.trim();
    let count = text.chars().count();
    if count <= STDERR_EXCERPT_CHARS {
        return text.to_string();
    }
    text.chars().skip(count - STDERR_EXCERPT_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, timeout: Duration) -> CaptureInvoker {
        let command: Vec<String> = ["sh", "-c", script, "sh", "{device}", "{output}"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        CaptureInvoker::new(&command, "/dev/video9", timeout).expect("invoker")
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = CaptureInvoker::new(&[], "/dev/video0", Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, DaemonError::Command(_)), "got: {err}");
    }

    #[test]
    fn placeholders_are_substituted_in_every_argument() {
        let command: Vec<String> = ["fswebcam", "-d", "{device}", "--save={output}", "{output}"]
            .into_iter()
            .map(str::to_owned)
            .collect();
        let invoker =
            CaptureInvoker::new(&command, "/dev/video2", Duration::from_secs(5)).expect("invoker");
        assert_eq!(
            invoker.render_args(Path::new("/captures/a.jpg")),
            vec!["-d", "/dev/video2", "--save=/captures/a.jpg", "/captures/a.jpg"]
        );
    }

    #[tokio::test]
    async fn success_requires_zero_exit_and_output_file() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("shot.jpg");
        let invoker = sh(r#"printf '%s' "$1" > "$2""#, Duration::from_secs(5));

        let outcome = invoker.capture(&out).await;
        assert!(outcome.is_success(), "got: {outcome:?}");
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "/dev/video9");
    }

    #[tokio::test]
    async fn non_zero_exit_is_reported_with_stderr() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("shot.jpg");
        let invoker = sh("echo 'no such device' >&2; exit 3", Duration::from_secs(5));

        match invoker.capture(&out).await {
            CaptureOutcome::ExitedNonZero { code, stderr } => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "no such device");
            }
            other => panic!("expected ExitedNonZero, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn zero_exit_without_file_is_missing_output() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("shot.jpg");
        let outcome = sh("exit 0", Duration::from_secs(5)).capture(&out).await;
        assert_eq!(outcome, CaptureOutcome::MissingOutput { path: out });
    }

    #[tokio::test]
    async fn hung_capture_is_killed_at_deadline() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("shot.jpg");
        let invoker = sh("exec sleep 30", Duration::from_millis(200));

        let started = std::time::Instant::now();
        let outcome = invoker.capture(&out).await;
        assert_eq!(
            outcome,
            CaptureOutcome::TimedOut {
                after: Duration::from_millis(200)
            }
        );
        assert!(started.elapsed() < Duration::from_secs(10));
        assert_eq!(outcome.kind(), "timed_out");
    }

    #[tokio::test]
    async fn missing_program_is_spawn_failure() {
        let command = vec!["glimpse-no-such-camera-tool".to_string(), "{output}".to_string()];
        let invoker =
            CaptureInvoker::new(&command, "/dev/video0", Duration::from_secs(1)).expect("invoker");
        let outcome = invoker.capture(Path::new("/nonexistent/out.jpg")).await;
        assert!(
            matches!(outcome, CaptureOutcome::SpawnFailed { .. }),
            "got: {outcome:?}"
        );
    }

    #[tokio::test]
    async fn timeout_kills_helpers_forked_by_the_capture_command() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("shot.jpg");
        let invoker = sh(
            r#"( sleep 1; printf late > "$2" ) & wait"#,
            Duration::from_millis(300),
        );

        let outcome = invoker.capture(&out).await;
        assert_eq!(outcome.kind(), "timed_out");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!out.exists(), "background writer outlived the capture");
    }

    #[tokio::test]
    async fn non_zero_exit_kills_backgrounded_helpers() {
        let tmp = TempDir::new().unwrap();
        let out = tmp.path().join("shot.jpg");
        let invoker = sh(
            r#"( sleep 1; printf late > "$2" ) >/dev/null 2>&1 & exit 4"#,
            Duration::from_secs(5),
        );

        let outcome = invoker.capture(&out).await;
        assert!(
            matches!(outcome, CaptureOutcome::ExitedNonZero { code: Some(4), .. }),
            "got: {outcome:?}"
        );

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!out.exists(), "background writer outlived the capture");
    }

    #[test]
    fn stderr_excerpt_keeps_tail() {
        let long = "x".repeat(STDERR_EXCERPT_CHARS) + "END";
        let excerpt = stderr_excerpt(long.as_bytes());
        assert_eq!(excerpt.chars().count(), STDERR_EXCERPT_CHARS);
        assert!(excerpt.ends_with("END"));
    }
}
