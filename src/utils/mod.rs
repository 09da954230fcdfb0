//! Process-level utilities

pub mod signals;

// Re-export main functions
pub use signals::shutdown_signal;
