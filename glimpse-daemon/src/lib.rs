//! Glimpse daemon: log stream → trigger → debounce → capture → finalize.

pub mod capture;
pub mod debounce;
mod error;
pub mod event_loop;
pub mod ownership;
mod runtime;
pub mod source;
pub mod store;

pub use capture::{CaptureInvoker, CaptureOutcome};
pub use debounce::{DebounceGate, GateDecision};
pub use error::DaemonError;
pub use event_loop::{EventLoop, LineOutcome, LoopStats};
pub use ownership::Ownership;
pub use runtime::{capture_once, run, start_blocking, LogFormat};
pub use source::{ChannelLogSource, CommandLogSource, LogSource, ReaderLogSource};
pub use store::{Artifact, ArtifactNaming, ArtifactStore};
