//! Countdown error types

use thiserror::Error;

use super::TimerPhase;

/// Errors reported by countdown operations
///
/// The only failure mode is logical: asking for a transition the current
/// phase does not permit. Rejected operations never mutate the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TimerError {
    #[error("cannot {op} a {from} countdown")]
    InvalidTransition {
        /// Phase the countdown was in when the operation was rejected
        from: TimerPhase,
        /// The rejected operation
        op: &'static str,
    },
}
