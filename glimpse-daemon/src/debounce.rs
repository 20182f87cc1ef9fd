//! Debounce policy: at most one capture per window.
//!
//! There is no in-memory "last capture" state. The reference point is always
//! the newest artifact's mtime, re-read at decision time, so the policy holds
//! across restarts.

use std::time::{Duration, SystemTime};

use crate::store::ArtifactStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    Suppress { elapsed: Duration },
}

impl GateDecision {
    pub fn is_allow(&self) -> bool {
        matches!(self, GateDecision::Allow)
    }
}

/// Decide whether a capture may start at `now`, given the mtime of the most
/// recent artifact.
///
/// An mtime in the future (clock stepped back) suppresses only while the skew
/// is inside the window; a larger skew must not block captures indefinitely.
pub fn decide(latest: Option<SystemTime>, now: SystemTime, window: Duration) -> GateDecision {
    let Some(latest) = latest else {
        return GateDecision::Allow;
    };
    match now.duration_since(latest) {
        Ok(elapsed) if elapsed < window => GateDecision::Suppress { elapsed },
        Ok(_) => GateDecision::Allow,
        Err(skew) if skew.duration() < window => GateDecision::Suppress {
            elapsed: Duration::ZERO,
        },
        Err(_) => GateDecision::Allow,
    }
}

/// [`decide`] bound to an [`ArtifactStore`] and the wall clock.
#[derive(Debug, Clone, Copy)]
pub struct DebounceGate {
    window: Duration,
}

impl DebounceGate {
    pub fn new(window: Duration) -> Self {
        Self { window }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Unreadable directories count as "no prior artifact" (fail open).
    pub fn evaluate(&self, store: &ArtifactStore) -> GateDecision {
        let latest = store.most_recent().map(|artifact| artifact.modified);
        decide(latest, SystemTime::now(), self.window)
    }
}
