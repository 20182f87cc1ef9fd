//! Configuration types for the Glimpse capture daemon.
//!
//! Every struct is `#[serde(default)]` so a partial YAML file only overrides
//! the fields it names. Durations are stored as whole seconds on disk and
//! exposed as [`Duration`] through accessor methods.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_ARTIFACT_DIR, DEFAULT_ARTIFACT_EXTENSION, DEFAULT_ARTIFACT_PREFIX,
    DEFAULT_CAPTURE_DEVICE, DEFAULT_CAPTURE_TIMEOUT_SECS, DEFAULT_DEBOUNCE_SECS, DEFAULT_TRIGGER,
    DEVICE_PLACEHOLDER, OUTPUT_PLACEHOLDER,
};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// The literal substring whose presence in a log line marks a security event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Trigger(pub String);

impl Trigger {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for Trigger {
    fn default() -> Self {
        Self(DEFAULT_TRIGGER.to_owned())
    }
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for Trigger {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for Trigger {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// Where log lines come from: a long-running follower command whose stdout is
/// consumed line by line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LogSourceConfig {
    pub command: Vec<String>,
}

impl Default for LogSourceConfig {
    fn default() -> Self {
        Self {
            command: ["journalctl", "-f", "-n", "0", "-o", "cat"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

/// The external capture action. `command` is a template: `{device}` and
/// `{output}` are substituted per invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CaptureConfig {
    pub device: String,
    pub command: Vec<String>,
    pub timeout_secs: u64,
}

impl CaptureConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device: DEFAULT_CAPTURE_DEVICE.to_owned(),
            command: [
                "fswebcam",
                "-d",
                DEVICE_PLACEHOLDER,
                "--no-banner",
                "-r",
                "1280x720",
                OUTPUT_PLACEHOLDER,
            ]
            .into_iter()
            .map(str::to_owned)
            .collect(),
            timeout_secs: DEFAULT_CAPTURE_TIMEOUT_SECS,
        }
    }
}

/// Layout of the artifact directory: `<dir>/<prefix>_<timestamp>.<extension>`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ArtifactsConfig {
    pub dir: PathBuf,
    pub prefix: String,
    pub extension: String,
}

impl Default for ArtifactsConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from(DEFAULT_ARTIFACT_DIR),
            prefix: DEFAULT_ARTIFACT_PREFIX.to_owned(),
            extension: DEFAULT_ARTIFACT_EXTENSION.to_owned(),
        }
    }
}

/// Identity that owns the artifact directory and every finalized artifact.
///
/// `None` for `user` means the daemon's effective uid. `None` for `group`
/// means the configured user's primary group, or the effective gid when no
/// user is named.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default, deny_unknown_fields)]
pub struct OwnerConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

/// Root of `config.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub trigger: Trigger,
    pub debounce_secs: u64,
    pub log_source: LogSourceConfig,
    pub capture: CaptureConfig,
    pub artifacts: ArtifactsConfig,
    pub owner: OwnerConfig,
}

impl Config {
    /// Minimum spacing between two successful captures.
    pub fn debounce_window(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            trigger: Trigger::default(),
            debounce_secs: DEFAULT_DEBOUNCE_SECS,
            log_source: LogSourceConfig::default(),
            capture: CaptureConfig::default(),
            artifacts: ArtifactsConfig::default(),
            owner: OwnerConfig::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
