//! # Reminder Registry
//!
//! The live set of armed reminders. Each key owns exactly one timer handle;
//! arming a key always cancels whatever handle it held before. A single
//! time-ordered queue backs all entries so one wake loop can serve them.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.0.0: Replaced per-reminder timers with one ordered queue
//! - 1.0.0: Initial release

use chrono::NaiveDateTime;
use log::debug;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use super::model::{ReminderKey, ReminderRule, TrackableEntity};

/// Opaque identity of one armed timer; never reused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

impl fmt::Display for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "timer#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Next occurrence of the weekly rule
    Recurring,
    /// One-shot firing set by a snooze; recurrence resumes after it fires
    Snoozed,
}

/// What a reminder fires for: enough to dispatch and re-arm without a lookup
#[derive(Debug, Clone, PartialEq)]
pub struct ReminderTarget {
    pub key: ReminderKey,
    pub entity_id: String,
    pub entity_title: String,
    pub rule: ReminderRule,
}

impl ReminderTarget {
    pub fn new(entity: &TrackableEntity, rule: &ReminderRule) -> Self {
        ReminderTarget {
            key: ReminderKey::new(&entity.id, rule.time_of_day),
            entity_id: entity.id.clone(),
            entity_title: entity.title.clone(),
            rule: rule.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ScheduledReminder {
    pub target: ReminderTarget,
    pub fire_at: NaiveDateTime,
    pub handle: TimerHandle,
    pub kind: EntryKind,
    /// When this key last fired, carried across re-arms
    pub last_fired_at: Option<NaiveDateTime>,
}

impl ScheduledReminder {
    pub fn key(&self) -> &ReminderKey {
        &self.target.key
    }

    pub fn entity_id(&self) -> &str {
        &self.target.entity_id
    }

    pub fn entity_title(&self) -> &str {
        &self.target.entity_title
    }
}

#[derive(Debug, Default)]
pub struct ReminderRegistry {
    entries: HashMap<ReminderKey, ScheduledReminder>,
    queue: BTreeMap<(NaiveDateTime, TimerHandle), ReminderKey>,
    next_handle: u64,
}

impl ReminderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm `target` to fire at `fire_at`, cancelling any handle its key already holds
    pub fn arm(
        &mut self,
        target: ReminderTarget,
        fire_at: NaiveDateTime,
        kind: EntryKind,
        last_fired_at: Option<NaiveDateTime>,
    ) -> TimerHandle {
        self.cancel(&target.key);

        self.next_handle += 1;
        let handle = TimerHandle(self.next_handle);
        self.queue.insert((fire_at, handle), target.key.clone());
        debug!("Armed {} for {} at {}", handle, target.key, fire_at);

        self.entries.insert(
            target.key.clone(),
            ScheduledReminder {
                target,
                fire_at,
                handle,
                kind,
                last_fired_at,
            },
        );
        handle
    }

    /// Remove the entry for `key` and drop its timer
    pub fn cancel(&mut self, key: &ReminderKey) -> Option<ScheduledReminder> {
        let entry = self.entries.remove(key)?;
        self.queue.remove(&(entry.fire_at, entry.handle));
        debug!("Cancelled {} for {}", entry.handle, key);
        Some(entry)
    }

    /// Drop every entry; returns how many were live
    pub fn clear(&mut self) -> usize {
        let count = self.entries.len();
        self.entries.clear();
        self.queue.clear();
        count
    }

    /// Remove and return every entry due at or before `now`, earliest first
    pub fn pop_due(&mut self, now: NaiveDateTime) -> Vec<ScheduledReminder> {
        let mut due = Vec::new();
        while let Some((&(fire_at, handle), _)) = self.queue.first_key_value() {
            if fire_at > now {
                break;
            }
            if let Some(key) = self.queue.remove(&(fire_at, handle)) {
                if let Some(entry) = self.entries.remove(&key) {
                    due.push(entry);
                }
            }
        }
        due
    }

    /// The instant the wake loop should next target
    pub fn next_fire_at(&self) -> Option<NaiveDateTime> {
        self.queue.first_key_value().map(|(&(fire_at, _), _)| fire_at)
    }

    pub fn get(&self, key: &ReminderKey) -> Option<&ScheduledReminder> {
        self.entries.get(key)
    }

    /// The entity's most recently fired entry, else its soonest one
    pub fn find_for_entity(&self, entity_id: &str) -> Option<&ScheduledReminder> {
        let mut candidates: Vec<&ScheduledReminder> = self
            .entries
            .values()
            .filter(|e| e.entity_id() == entity_id)
            .collect();

        candidates.sort_by(|a, b| {
            b.last_fired_at
                .cmp(&a.last_fired_at)
                .then(a.fire_at.cmp(&b.fire_at))
                .then(a.key().cmp(b.key()))
        });
        candidates.into_iter().next()
    }

    /// Entries ordered by fire time
    pub fn entries(&self) -> Vec<&ScheduledReminder> {
        self.queue
            .values()
            .filter_map(|key| self.entries.get(key))
            .collect()
    }

    /// Number of armed timers held for `key` (0 or 1 while invariants hold)
    pub fn live_handles(&self, key: &ReminderKey) -> usize {
        self.queue.values().filter(|k| *k == key).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
