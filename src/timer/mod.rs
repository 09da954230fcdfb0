//! Countdown timer core
//!
//! This module provides:
//! - **`Countdown`**: a single pausable, abortable countdown driven by a
//!   background 1-second tick source
//! - **Phases**: the `Idle -> Running -> Paused/Completed/Aborted`
//!   lifecycle and consistent snapshots of it
//! - **Events**: the observer contract (`Tick`, `Completed`, `Aborted`)
//!   delivered over a broadcast channel
//!
//! The core performs no I/O and knows nothing about the HTTP surface
//! that owns it.

pub mod countdown;
pub mod error;
pub mod event;
pub mod phase;

// Re-export main types
pub use countdown::{Countdown, TICK_INTERVAL};
pub use error::TimerError;
pub use event::TimerEvent;
pub use phase::{TimerPhase, TimerSnapshot};
