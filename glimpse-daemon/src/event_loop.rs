//! The capture pipeline, one line at a time.
//!
//! detect → debounce → capture → finalize, strictly sequential. At most one
//! capture process exists at any moment; lines that arrive meanwhile wait in
//! the source's buffer and are evaluated afterwards against a fresh clock.

use std::path::PathBuf;
use std::time::Duration;

use chrono::Local;
use tokio::sync::broadcast;

use glimpse_detector::TriggerDetector;

use crate::capture::{CaptureInvoker, CaptureOutcome};
use crate::debounce::{DebounceGate, GateDecision};
use crate::error::DaemonError;
use crate::source::LogSource;
use crate::store::ArtifactStore;

/// What happened to a single line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineOutcome {
    /// No trigger in the line.
    Ignored,
    /// Trigger seen inside the debounce window.
    Suppressed { elapsed: Duration },
    /// Capture succeeded. `finalized` is false when locking the file down
    /// failed; the artifact still counts for debounce.
    Captured { artifact: PathBuf, finalized: bool },
    /// Capture attempted and failed; nothing was finalized.
    CaptureFailed(CaptureOutcome),
}

/// Running counters, logged when the loop ends.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoopStats {
    pub lines: u64,
    pub triggers: u64,
    pub suppressed: u64,
    pub captured: u64,
    pub failed: u64,
}

pub struct EventLoop<S> {
    source: S,
    detector: TriggerDetector,
    gate: DebounceGate,
    invoker: CaptureInvoker,
    store: ArtifactStore,
    stats: LoopStats,
}

impl<S: LogSource> EventLoop<S> {
    pub fn new(
        source: S,
        detector: TriggerDetector,
        gate: DebounceGate,
        invoker: CaptureInvoker,
        store: ArtifactStore,
    ) -> Self {
        Self {
            source,
            detector,
            gate,
            invoker,
            store,
            stats: LoopStats::default(),
        }
    }

    pub fn stats(&self) -> LoopStats {
        self.stats
    }

    pub fn store(&self) -> &ArtifactStore {
        &self.store
    }

    /// Consume the source until it ends (fatal) or `shutdown` fires (clean).
    pub async fn run(
        &mut self,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<LoopStats, DaemonError> {
        self.store.ensure_directory()?;
        tracing::info!(
            trigger = %self.detector.trigger(),
            dir = %self.store.dir().display(),
            debounce_ms = self.gate.window().as_millis() as u64,
            capture_timeout_ms = self.invoker.timeout().as_millis() as u64,
            "event loop started",
        );

        loop {
            tokio::select! {
                biased;
                _ = shutdown.recv() => {
                    tracing::info!("shutdown requested, leaving event loop");
                    return Ok(self.stats);
                }
                line = self.source.next_line() => {
                    match line? {
                        Some(line) => {
                            self.handle_line(&line).await?;
                        }
                        None => {
                            tracing::error!(stats = ?self.stats, "log stream closed");
                            return Err(DaemonError::LogStreamClosed);
                        }
                    }
                }
            }
        }
    }

    /// Run one line through the pipeline. Only directory setup failures are
    /// errors; every capture problem comes back as a [`LineOutcome`].
    pub async fn handle_line(&mut self, line: &str) -> Result<LineOutcome, DaemonError> {
        self.stats.lines += 1;
        if !self.detector.matches(line) {
            return Ok(LineOutcome::Ignored);
        }
        self.stats.triggers += 1;

        if let GateDecision::Suppress { elapsed } = self.gate.evaluate(&self.store) {
            self.stats.suppressed += 1;
            tracing::trace!(elapsed_ms = elapsed.as_millis() as u64, "trigger suppressed");
            return Ok(LineOutcome::Suppressed { elapsed });
        }

        self.store.ensure_directory()?;
        let path = self.store.next_artifact_path(&Local::now());
        let outcome = self.invoker.capture(&path).await;

        if !outcome.is_success() {
            self.stats.failed += 1;
            tracing::warn!(
                outcome = outcome.kind(),
                detail = ?outcome,
                path = %path.display(),
                "capture failed",
            );
            self.store.discard_partial(&path);
            return Ok(LineOutcome::CaptureFailed(outcome));
        }

        self.stats.captured += 1;
        let finalized = match self.store.finalize(&path) {
            Ok(()) => true,
            Err(err) => {
                tracing::error!(path = %path.display(), error = %err, "artifact finalization failed");
                false
            }
        };
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        tracing::info!(artifact = %file_name, finalized, "captured artifact");

        Ok(LineOutcome::Captured {
            artifact: path,
            finalized,
        })
    }
}
