//! # Snooze Controller
//!
//! Pushes one firing of an entity's reminder back by a fixed delay. Only that
//! firing moves: once the snoozed entry fires, the scheduler re-arms it from
//! the rule's own time of day as usual.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.4.0

use anyhow::{anyhow, bail, Result};
use chrono::{Duration, NaiveDateTime};
use log::info;

use super::registry::EntryKind;
use super::scheduler::{ReminderEvent, ReminderScheduler};

/// Longest snooze accepted; anything longer should be a schedule change
pub const MAX_SNOOZE_MINUTES: u32 = 24 * 60;

impl ReminderScheduler {
    /// Re-arm the entity's live reminder as a one-shot `minutes` from now.
    ///
    /// When the entity has several reminder times the most recently fired one
    /// is snoozed. Returns the new fire time.
    pub fn snooze(&self, entity_id: &str, minutes: u32) -> Result<NaiveDateTime> {
        if minutes == 0 {
            bail!("Snooze needs at least one minute");
        }
        if minutes > MAX_SNOOZE_MINUTES {
            bail!("Snooze of {minutes} minutes is longer than a day");
        }

        let until = self.clock.now() + Duration::minutes(minutes as i64);
        let key = {
            let mut registry = self.registry();
            let entry = registry
                .find_for_entity(entity_id)
                .cloned()
                .ok_or_else(|| anyhow!("No live reminder for {entity_id}"))?;

            registry.arm(entry.target.clone(), until, EntryKind::Snoozed, entry.last_fired_at);
            entry.target.key
        };

        self.wake.notify_one();
        info!("😴 Snoozed {key} for {minutes} minutes (until {until})");
        self.emit(ReminderEvent::Snoozed {
            key,
            entity_id: entity_id.to_string(),
            until,
        });
        Ok(until)
    }
}
