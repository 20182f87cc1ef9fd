//! Trigger detection for `glimpse-detector`.
//!
//! `TriggerDetector::matches(line)` is a literal, case-sensitive substring
//! test against the configured trigger. No pattern syntax is interpreted and
//! no state survives between calls.

use glimpse_core::Trigger;
use thiserror::Error;

/// Errors from detector construction.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DetectError {
    #[error("trigger must not be empty: it would match every log line")]
    EmptyTrigger,
}

/// Flags log lines that contain the trigger substring.
#[derive(Debug, Clone)]
pub struct TriggerDetector {
    trigger: Trigger,
}

impl TriggerDetector {
    pub fn new(trigger: Trigger) -> Result<Self, DetectError> {
        if trigger.as_str().is_empty() {
            return Err(DetectError::EmptyTrigger);
        }
        Ok(Self { trigger })
    }

    pub fn trigger(&self) -> &Trigger {
        &self.trigger
    }

    /// `true` when `line` contains the trigger verbatim.
    pub fn matches(&self, line: &str) -> bool {
        line.contains(self.trigger.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_trigger_is_rejected() {
        assert_eq!(
            TriggerDetector::new(Trigger::from("")).unwrap_err(),
            DetectError::EmptyTrigger
        );
    }

    #[test]
    fn exposes_configured_trigger() {
        let detector = TriggerDetector::new(Trigger::from("sshd")).expect("detector");
        assert_eq!(detector.trigger().as_str(), "sshd");
    }
}
