//! Events delivered to countdown observers

use serde::{Deserialize, Serialize};

/// Notification emitted by a running countdown
///
/// `Tick` is sent on every 1-second decrement while running. `Completed`
/// and `Aborted` are each sent at most once, and nothing follows them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TimerEvent {
    /// One second elapsed; carries the new remaining time
    Tick { remaining_seconds: u64 },
    /// The countdown reached zero naturally
    Completed,
    /// The countdown was cancelled before reaching zero
    Aborted,
}

impl TimerEvent {
    /// Check whether this event ends the countdown's event stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimerEvent::Completed | TimerEvent::Aborted)
    }
}
