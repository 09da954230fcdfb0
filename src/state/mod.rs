//! State management module
//!
//! This module contains the application-level state wrapped around the
//! countdown core.

pub mod app_state;

// Re-export main types
pub use app_state::AppState;
