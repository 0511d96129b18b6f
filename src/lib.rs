// Core layer - shared configuration and helpers
pub mod core;

// Features layer - all feature modules
pub mod features;

// Infrastructure
pub mod database;

// Re-export core config for convenience
pub use core::Config;

// Re-export feature items
pub use features::reminders::{
    PlatformNotifier, ReminderEvent, ReminderScheduler, SettingsStore, TrackableEntity,
};
