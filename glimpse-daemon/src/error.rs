use std::path::PathBuf;

use thiserror::Error;

/// Error surface for the daemon runtime. Every variant is fatal to the event
/// loop; recoverable conditions are reported as values, not errors.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("config error: {0}")]
    Config(#[from] glimpse_core::ConfigError),

    #[error("detector error: {0}")]
    Detect(#[from] glimpse_detector::DetectError),

    #[error("cannot change ownership of {path}: {source}")]
    Chown {
        path: PathBuf,
        #[source]
        source: nix::Error,
    },

    #[error("artifact path exists but is not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("identity lookup failed: {0}")]
    Identity(String),

    #[error("log stream closed")]
    LogStreamClosed,

    #[error("invalid command: {0}")]
    Command(String),

    #[error("daemon runtime error: {0}")]
    Runtime(String),
}

pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> DaemonError {
    DaemonError::Io {
        path: path.into(),
        source,
    }
}
