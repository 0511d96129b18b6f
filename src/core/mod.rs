//! # Core Module
//!
//! Configuration and shared helpers for the reminder engine and its host.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.1.0: Add humanize module with duration parsing and relative labels
//! - 1.0.0: Initial creation with config module

pub mod config;
pub mod humanize;

// Re-export commonly used items
pub use config::Config;
pub use humanize::{format_duration, parse_duration_minutes, time_until_label};
