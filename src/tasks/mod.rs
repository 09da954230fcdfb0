//! Background tasks module
//!
//! This module contains background tasks that run alongside the HTTP
//! server.

pub mod monitor;

// Re-export main functions
pub use monitor::timer_monitor_task;
