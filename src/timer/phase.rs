//! Countdown phases and point-in-time snapshots

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle phase of a countdown
///
/// `Completed` and `Aborted` are terminal: once reached, no further
/// transitions are accepted and a fresh [`Countdown`](super::Countdown)
/// must be constructed to run again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerPhase {
    /// Constructed but never started
    Idle,
    /// Ticking down once per second
    Running,
    /// Stopped with remaining time preserved
    Paused,
    /// Reached zero naturally
    Completed,
    /// Cancelled before reaching zero
    Aborted,
}

impl TimerPhase {
    /// Check whether this phase permits no further transitions
    pub fn is_terminal(&self) -> bool {
        matches!(self, TimerPhase::Completed | TimerPhase::Aborted)
    }
}

impl fmt::Display for TimerPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TimerPhase::Idle => "idle",
            TimerPhase::Running => "running",
            TimerPhase::Paused => "paused",
            TimerPhase::Completed => "completed",
            TimerPhase::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Consistent view of a countdown, taken under its state lock
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerSnapshot {
    pub phase: TimerPhase,
    pub total_seconds: u64,
    pub remaining_seconds: u64,
}

impl TimerSnapshot {
    /// Check if the countdown is currently ticking
    pub fn is_running(&self) -> bool {
        self.phase == TimerPhase::Running
    }
}
