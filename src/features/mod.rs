//! # Features
//!
//! - **reminders**: recurring habit reminder engine

pub mod reminders;

pub use reminders::ReminderScheduler;
