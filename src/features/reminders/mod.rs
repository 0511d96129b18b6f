//! # Reminders Feature
//!
//! Recurring habit reminders: weekly rules become armed registry entries,
//! fire through the platform notifier, and re-arm themselves for the next
//! occurrence. Best-effort and in-process only; the host re-primes the
//! schedule with `schedule_all` on every start.
//!
//! - **Version**: 2.1.0
//! - **Since**: 0.1.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.1.0: Snooze controller and interaction routing
//! - 2.0.0: Single wake loop replaces per-reminder timers
//! - 1.0.0: Initial release

pub mod clock;
pub mod dispatcher;
pub mod model;
pub mod occurrence;
pub mod permission;
pub mod platform;
pub mod registry;
pub mod scheduler;
pub mod settings;
pub mod snooze;
pub mod upcoming;

pub use clock::{Clock, ManualClock, SystemClock};
pub use dispatcher::{DispatchReport, Dispatcher, Interaction, NotificationAction};
pub use model::{load_entities, ReminderKey, ReminderRule, TimeOfDay, TrackableEntity, WeekdaySet};
pub use occurrence::next_occurrence;
pub use permission::{PermissionGate, PermissionState};
pub use platform::{HeadlessNotifier, InAppAlert, NotificationPayload, PlatformNotifier, RecordingNotifier};
pub use registry::{EntryKind, ScheduledReminder, TimerHandle};
pub use scheduler::{ReminderEvent, ReminderScheduler, ScheduleSummary, SchedulerOptions};
pub use settings::{KeyValueStore, MemoryStore, NotificationSettings, SettingsStore};
pub use upcoming::UpcomingReminder;
