//! # Reminder Scheduler
//!
//! Service object driving the registry: turns entity reminder rules into armed
//! entries, fires whatever is due, and re-arms each fired key for its next
//! weekly occurrence. One wake loop sleeps until the earliest armed instant
//! and is nudged awake whenever the schedule changes.
//!
//! - **Version**: 2.1.1
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 2.1.1: Rules sharing a key count once; the later rule wins with a warning
//! - 2.1.0: Broadcast ReminderEvent stream for hosts
//! - 2.0.0: Single wake loop over the registry queue, injectable clock
//! - 1.0.0: Initial release with one timer per reminder

use anyhow::Result;
use chrono::NaiveDateTime;
use log::{debug, info, warn};
use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::{broadcast, watch, Notify};

use super::clock::Clock;
use super::dispatcher::{completion_url, DispatchReport, Dispatcher, Interaction, Route};
use super::model::{ReminderKey, ReminderRule, TimeOfDay, TrackableEntity};
use super::occurrence::next_occurrence;
use super::permission::{PermissionGate, PermissionState};
use super::platform::PlatformNotifier;
use super::registry::{EntryKind, ReminderRegistry, ReminderTarget, ScheduledReminder};
use super::settings::SettingsStore;
use super::upcoming::{project_upcoming, UpcomingReminder};
use crate::core::Config;

/// Event channel capacity
const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Activity hosts can subscribe to
#[derive(Debug, Clone, PartialEq)]
pub enum ReminderEvent {
    Fired {
        key: ReminderKey,
        entity_id: String,
        fire_at: NaiveDateTime,
        report: DispatchReport,
    },
    Snoozed {
        key: ReminderKey,
        entity_id: String,
        until: NaiveDateTime,
    },
    /// The user clicked a notification; show the entity's completion view
    OpenCompletion { entity_id: String, url: String },
}

/// Outcome of a full rebuild
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScheduleSummary {
    pub armed: usize,
    pub disabled: usize,
    /// Enabled rules without any valid day
    pub skipped: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SchedulerOptions {
    pub auto_dismiss: Duration,
    pub max_wake: Duration,
}

impl Default for SchedulerOptions {
    fn default() -> Self {
        SchedulerOptions {
            auto_dismiss: Duration::from_secs(30),
            max_wake: Duration::from_secs(60),
        }
    }
}

impl From<&Config> for SchedulerOptions {
    fn from(config: &Config) -> Self {
        SchedulerOptions {
            auto_dismiss: config.auto_dismiss,
            max_wake: config.max_wake,
        }
    }
}

pub struct ReminderScheduler {
    pub(super) registry: Mutex<ReminderRegistry>,
    pub(super) clock: Arc<dyn Clock>,
    pub(super) wake: Notify,
    pub(super) events: broadcast::Sender<ReminderEvent>,
    dispatcher: Dispatcher,
    permission: Arc<PermissionGate>,
    settings: Arc<SettingsStore>,
    max_wake: Duration,
}

impl ReminderScheduler {
    pub fn new(
        notifier: Arc<dyn PlatformNotifier>,
        settings: Arc<SettingsStore>,
        clock: Arc<dyn Clock>,
        options: SchedulerOptions,
    ) -> Self {
        let permission = Arc::new(PermissionGate::new(notifier.clone()));
        let dispatcher = Dispatcher::new(
            notifier,
            permission.clone(),
            settings.clone(),
            options.auto_dismiss,
        );
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);

        ReminderScheduler {
            registry: Mutex::new(ReminderRegistry::new()),
            clock,
            wake: Notify::new(),
            events,
            dispatcher,
            permission,
            settings,
            max_wake: options.max_wake,
        }
    }

    pub(super) fn registry(&self) -> MutexGuard<'_, ReminderRegistry> {
        match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReminderEvent> {
        self.events.subscribe()
    }

    pub(super) fn emit(&self, event: ReminderEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    pub fn settings(&self) -> &Arc<SettingsStore> {
        &self.settings
    }

    pub async fn request_permission(&self) -> bool {
        self.permission.request_permission().await
    }

    pub fn permission_status(&self) -> PermissionState {
        self.permission.status()
    }

    /// Tear down every armed reminder and rebuild from `entities`.
    ///
    /// The registry lock is held for the whole rebuild, so no caller or the
    /// wake loop ever sees a half-built schedule. Each rule is scheduled on its
    /// own; one bad rule never stops the rest. Two enabled rules with the same
    /// time of day share a key, so the later one replaces the earlier.
    pub fn schedule_all(&self, entities: &[TrackableEntity]) -> ScheduleSummary {
        let now = self.clock.now();
        let lead = self.settings.get().lead_minutes;
        let mut summary = ScheduleSummary::default();

        {
            let mut registry = self.registry();
            let cleared = registry.clear();
            if cleared > 0 {
                debug!("Cleared {cleared} armed reminders before rebuild");
            }

            let mut seen: HashSet<ReminderKey> = HashSet::new();
            for entity in entities {
                for rule in &entity.reminders {
                    if !rule.enabled {
                        summary.disabled += 1;
                        continue;
                    }
                    let target = ReminderTarget::new(entity, rule);
                    if !seen.insert(target.key.clone()) {
                        warn!(
                            "Reminder {} for {} replaces an earlier rule at the same time of day",
                            target.key, entity.id
                        );
                    }
                    if Self::arm_next(&mut registry, target, lead, now, None).is_none() {
                        summary.skipped += 1;
                    }
                }
            }
            summary.armed = registry.len();
        }

        self.wake.notify_one();
        info!(
            "📅 Scheduled {} reminders for {} habits ({} disabled, {} skipped)",
            summary.armed,
            entities.len(),
            summary.disabled,
            summary.skipped
        );
        summary
    }

    /// (Re)arm a single rule; a disabled rule only cancels its key.
    ///
    /// Returns the armed fire time, or `None` when nothing is armed.
    pub fn schedule_one(&self, entity: &TrackableEntity, rule: &ReminderRule) -> Option<NaiveDateTime> {
        let target = ReminderTarget::new(entity, rule);
        let armed = {
            let mut registry = self.registry();
            if rule.enabled {
                let lead = self.settings.get().lead_minutes;
                Self::arm_next(&mut registry, target, lead, self.clock.now(), None)
            } else {
                if registry.cancel(&target.key).is_some() {
                    info!("Cancelled disabled reminder {}", target.key);
                }
                None
            }
        };
        self.wake.notify_one();
        armed
    }

    /// Cancel-then-arm for the next weekly occurrence after `now`
    fn arm_next(
        registry: &mut ReminderRegistry,
        target: ReminderTarget,
        lead_minutes: u32,
        now: NaiveDateTime,
        last_fired_at: Option<NaiveDateTime>,
    ) -> Option<NaiveDateTime> {
        registry.cancel(&target.key);

        let rule = &target.rule;
        match next_occurrence(rule.time_of_day, rule.active_days, lead_minutes, now) {
            Some(fire_at) => {
                registry.arm(target, fire_at, EntryKind::Recurring, last_fired_at);
                Some(fire_at)
            }
            None => {
                warn!("Reminder {} has no active days; leaving it unscheduled", target.key);
                None
            }
        }
    }

    pub fn cancel(&self, key: &ReminderKey) -> bool {
        let removed = self.registry().cancel(key).is_some();
        if removed {
            self.wake.notify_one();
        }
        removed
    }

    /// Cancel every reminder belonging to an entity (e.g. it was deleted)
    pub fn cancel_entity(&self, entity_id: &str) -> usize {
        let mut registry = self.registry();
        let keys: Vec<ReminderKey> = registry
            .entries()
            .into_iter()
            .filter(|e| e.entity_id() == entity_id)
            .map(|e| e.key().clone())
            .collect();
        for key in &keys {
            registry.cancel(key);
        }
        drop(registry);

        if !keys.is_empty() {
            self.wake.notify_one();
        }
        keys.len()
    }

    /// Drop everything, e.g. on logout
    pub fn cancel_all(&self) -> usize {
        let count = self.registry().clear();
        self.wake.notify_one();
        info!("Cancelled all {count} reminders");
        count
    }

    /// Fire every entry that is due.
    ///
    /// Each fired key is re-armed for its rule's next weekly occurrence in the
    /// same critical section it was popped in, then dispatched. A snoozed entry
    /// resumes normal recurrence the same way.
    pub fn fire_due(&self) -> usize {
        let now = self.clock.now();
        let lead = self.settings.get().lead_minutes;

        let fired: Vec<ScheduledReminder> = {
            let mut registry = self.registry();
            let due = registry.pop_due(now);
            for entry in &due {
                Self::arm_next(&mut registry, entry.target.clone(), lead, now, Some(entry.fire_at));
            }
            due
        };

        for entry in &fired {
            debug!("Firing {} ({:?}) scheduled for {}", entry.key(), entry.kind, entry.fire_at);
            let report = self.dispatcher.dispatch(&entry.target);
            self.emit(ReminderEvent::Fired {
                key: entry.key().clone(),
                entity_id: entry.entity_id().to_string(),
                fire_at: entry.fire_at,
                report,
            });
        }
        fired.len()
    }

    /// Run the wake loop until `shutdown` flips to true or its sender is dropped
    pub async fn run(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        info!("⏰ Reminder wake loop started");

        loop {
            if *shutdown.borrow() {
                break;
            }

            self.fire_due();
            let sleep_for = self.time_until_next_wake();

            tokio::select! {
                _ = tokio::time::sleep(sleep_for) => {}
                _ = self.wake.notified() => {
                    debug!("Schedule changed; re-targeting wake loop");
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        info!("Reminder wake loop stopped");
    }

    fn time_until_next_wake(&self) -> Duration {
        let now = self.clock.now();
        match self.registry().next_fire_at() {
            Some(fire_at) => (fire_at - now)
                .to_std()
                .unwrap_or(Duration::ZERO)
                .min(self.max_wake),
            None => self.max_wake,
        }
    }

    pub fn next_fire_at(&self) -> Option<NaiveDateTime> {
        self.registry().next_fire_at()
    }

    /// Snapshot of the armed entries, soonest first
    pub fn scheduled(&self) -> Vec<ScheduledReminder> {
        self.registry().entries().into_iter().cloned().collect()
    }

    pub fn scheduled_for(&self, key: &ReminderKey) -> Option<ScheduledReminder> {
        self.registry().get(key).cloned()
    }

    /// Upcoming reminders for a widget, computed from the rules rather than the registry
    pub fn get_upcoming(&self, entities: &[TrackableEntity]) -> Vec<UpcomingReminder> {
        project_upcoming(entities, self.settings.get().lead_minutes, self.clock.now())
    }

    /// Run the dispatch path once, right now, so the user can check what works
    pub fn send_test_notification(&self) -> DispatchReport {
        let target = ReminderTarget {
            key: ReminderKey::test_notification(),
            entity_id: "test".to_string(),
            entity_title: "Test reminder".to_string(),
            rule: ReminderRule::daily(TimeOfDay::from_naive(self.clock.now().time()))
                .with_message("Notifications are working 🎉"),
        };
        let report = self.dispatcher.dispatch(&target);
        info!("Sent test notification: {report:?}");
        report
    }

    /// Route a click, snooze or dismiss coming back from a notification
    pub fn handle_interaction(&self, interaction: &Interaction) -> Result<()> {
        match self.dispatcher.route(interaction) {
            Route::OpenCompletion { entity_id } => {
                info!("Opening completion view for {entity_id}");
                let url = completion_url(&entity_id);
                self.emit(ReminderEvent::OpenCompletion { entity_id, url });
            }
            Route::Snooze { entity_id, minutes } => {
                self.snooze(&entity_id, minutes)?;
            }
            Route::Dismissed => {
                debug!("Notification {} dismissed", interaction.tag);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::clock::ManualClock;
    use crate::features::reminders::dispatcher::NotificationAction;
    use crate::features::reminders::model::WeekdaySet;
    use crate::features::reminders::platform::RecordingNotifier;
    use crate::features::reminders::settings::MemoryStore;
    use chrono::{Duration as ChronoDuration, NaiveDate};

    /// Tuesday 2024-01-02 at the given time
    fn tue(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn harness(start: NaiveDateTime) -> (Arc<ReminderScheduler>, Arc<RecordingNotifier>, Arc<ManualClock>) {
        let notifier = Arc::new(RecordingNotifier::pre_granted());
        let clock = Arc::new(ManualClock::new(start));
        let settings = Arc::new(SettingsStore::load(Arc::new(MemoryStore::new())));
        let options = SchedulerOptions {
            auto_dismiss: Duration::ZERO,
            max_wake: Duration::from_millis(10),
        };
        let scheduler = Arc::new(ReminderScheduler::new(
            notifier.clone(),
            settings,
            clock.clone(),
            options,
        ));
        (scheduler, notifier, clock)
    }

    fn habit(id: &str, time: &str) -> TrackableEntity {
        TrackableEntity::new(id, format!("Habit {id}"))
            .with_reminder(ReminderRule::daily(time.parse().unwrap()))
    }

    fn key(id: &str, time: &str) -> ReminderKey {
        ReminderKey::new(id, time.parse().unwrap())
    }

    #[test]
    fn test_schedule_all_arms_enabled_rules() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let entities = vec![
            TrackableEntity::new("h1", "Stretch").with_reminder(
                ReminderRule::daily("09:00".parse().unwrap()).on_days(WeekdaySet::from_indices([1, 3, 5])),
            ),
            habit("h2", "18:00"),
            TrackableEntity::new("h3", "Off").with_reminder(ReminderRule::daily("07:00".parse().unwrap()).disabled()),
            TrackableEntity::new("h4", "Nowhere")
                .with_reminder(ReminderRule::daily("07:00".parse().unwrap()).on_days(WeekdaySet::EMPTY)),
        ];

        let summary = scheduler.schedule_all(&entities);
        assert_eq!(summary, ScheduleSummary { armed: 2, disabled: 1, skipped: 1 });

        let h1 = scheduler.scheduled_for(&key("h1", "09:00")).unwrap();
        assert_eq!(h1.fire_at, NaiveDate::from_ymd_opt(2024, 1, 3).unwrap().and_hms_opt(9, 0, 0).unwrap());
        assert_eq!(scheduler.scheduled_for(&key("h2", "18:00")).unwrap().fire_at, tue(18, 0));
        assert!(scheduler.scheduled_for(&key("h3", "07:00")).is_none());
        assert!(scheduler.scheduled_for(&key("h4", "07:00")).is_none());
        assert_eq!(scheduler.next_fire_at(), Some(tue(18, 0)));
    }

    #[test]
    fn test_schedule_all_same_time_rules_share_one_key() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let entity = TrackableEntity::new("h1", "Stretch")
            .with_reminder(ReminderRule::daily("09:00".parse().unwrap()).on_days(WeekdaySet::from_indices([1])))
            .with_reminder(ReminderRule::daily("09:00".parse().unwrap()).on_days(WeekdaySet::from_indices([5])));

        let summary = scheduler.schedule_all(&[entity]);
        assert_eq!(summary, ScheduleSummary { armed: 1, disabled: 0, skipped: 0 });
        assert_eq!(scheduler.scheduled().len(), 1);
        assert_eq!(scheduler.registry().live_handles(&key("h1", "09:00")), 1);

        // Later rule wins: Friday 2024-01-05
        let entry = scheduler.scheduled_for(&key("h1", "09:00")).unwrap();
        assert_eq!(entry.fire_at, NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(9, 0, 0).unwrap());
    }

    #[test]
    fn test_schedule_one_twice_keeps_single_handle() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let entity = habit("h1", "12:00");
        let rule = entity.reminders[0].clone();

        scheduler.schedule_one(&entity, &rule);
        let first = scheduler.scheduled_for(&key("h1", "12:00")).unwrap().handle;
        scheduler.schedule_one(&entity, &rule);
        let second = scheduler.scheduled_for(&key("h1", "12:00")).unwrap().handle;

        assert_ne!(first, second);
        assert_eq!(scheduler.registry().live_handles(&key("h1", "12:00")), 1);
        assert_eq!(scheduler.scheduled().len(), 1);
    }

    #[test]
    fn test_schedule_one_empty_days_is_not_an_error() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let entity = TrackableEntity::new("h1", "Never");
        let rule = ReminderRule::daily("12:00".parse().unwrap()).on_days(WeekdaySet::EMPTY);

        assert_eq!(scheduler.schedule_one(&entity, &rule), None);
        assert!(scheduler.scheduled().is_empty());
    }

    #[test]
    fn test_rebuild_does_not_duplicate() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let entities = vec![habit("h1", "12:00"), habit("h2", "13:00")];

        scheduler.schedule_all(&entities);
        scheduler.schedule_all(&entities);
        scheduler.schedule_all(&entities);

        assert_eq!(scheduler.scheduled().len(), 2);
        assert_eq!(scheduler.registry().live_handles(&key("h1", "12:00")), 1);
    }

    #[test]
    fn test_fire_renews_with_later_fire_time() {
        let (scheduler, notifier, clock) = harness(tue(10, 0));
        scheduler.schedule_all(&[habit("h1", "12:00")]);
        let before = scheduler.scheduled_for(&key("h1", "12:00")).unwrap();

        assert_eq!(scheduler.fire_due(), 0);
        clock.set(tue(12, 0));
        assert_eq!(scheduler.fire_due(), 1);

        let after = scheduler.scheduled_for(&key("h1", "12:00")).unwrap();
        assert!(after.fire_at > before.fire_at);
        assert_eq!(after.fire_at, tue(12, 0) + ChronoDuration::days(1));
        assert_eq!(after.last_fired_at, Some(tue(12, 0)));
        assert_eq!(after.kind, EntryKind::Recurring);
        assert_eq!(notifier.shown().len(), 1);
        assert_eq!(notifier.shown()[0].tag, "reminder-h1-12:00");

        // Nothing more until tomorrow
        assert_eq!(scheduler.fire_due(), 0);
    }

    #[test]
    fn test_skipped_days_vary_the_gap() {
        // Mon/Fri at 08:00 starting Tuesday
        let (scheduler, _, clock) = harness(tue(10, 0));
        let entity = TrackableEntity::new("h1", "Gym").with_reminder(
            ReminderRule::daily("08:00".parse().unwrap()).on_days(WeekdaySet::from_indices([1, 5])),
        );
        scheduler.schedule_all(&[entity]);

        let friday = NaiveDate::from_ymd_opt(2024, 1, 5).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(scheduler.next_fire_at(), Some(friday));

        clock.set(friday);
        scheduler.fire_due();
        let monday = NaiveDate::from_ymd_opt(2024, 1, 8).unwrap().and_hms_opt(8, 0, 0).unwrap();
        assert_eq!(scheduler.next_fire_at(), Some(monday));
    }

    #[test]
    fn test_disable_then_rebuild_cancels() {
        let (scheduler, notifier, clock) = harness(tue(10, 0));
        let mut entity = habit("h1", "12:00");
        scheduler.schedule_all(std::slice::from_ref(&entity));
        assert_eq!(scheduler.scheduled().len(), 1);

        entity.reminders[0].enabled = false;
        scheduler.schedule_all(std::slice::from_ref(&entity));
        assert!(scheduler.scheduled_for(&key("h1", "12:00")).is_none());

        clock.advance(ChronoDuration::days(8));
        assert_eq!(scheduler.fire_due(), 0);
        assert!(notifier.shown().is_empty());
    }

    #[test]
    fn test_schedule_one_disabled_cancels_live_entry() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let entity = habit("h1", "12:00");
        scheduler.schedule_all(std::slice::from_ref(&entity));

        let disabled = entity.reminders[0].clone().disabled();
        assert_eq!(scheduler.schedule_one(&entity, &disabled), None);
        assert!(scheduler.scheduled().is_empty());
    }

    #[test]
    fn test_same_time_different_habits_fire_independently() {
        let (scheduler, notifier, clock) = harness(tue(10, 0));
        scheduler.schedule_all(&[habit("h1", "12:00"), habit("h2", "12:00")]);
        assert_eq!(scheduler.scheduled().len(), 2);

        clock.set(tue(12, 0));
        assert_eq!(scheduler.fire_due(), 2);

        let mut tags: Vec<String> = notifier.shown().into_iter().map(|p| p.tag).collect();
        tags.sort();
        assert_eq!(tags, vec!["reminder-h1-12:00", "reminder-h2-12:00"]);
        assert_eq!(scheduler.scheduled().len(), 2);
    }

    #[test]
    fn test_lead_minutes_come_from_settings() {
        let (scheduler, _, _) = harness(tue(10, 0));
        scheduler.settings().update(|s| s.lead_minutes = 15).unwrap();
        scheduler.schedule_all(&[habit("h1", "12:00")]);
        assert_eq!(scheduler.next_fire_at(), Some(tue(11, 45)));
    }

    #[test]
    fn test_cancel_variants() {
        let (scheduler, _, _) = harness(tue(10, 0));
        let two_times = habit("h1", "12:00").with_reminder(ReminderRule::daily("20:00".parse().unwrap()));
        scheduler.schedule_all(&[two_times, habit("h2", "12:00")]);
        assert_eq!(scheduler.scheduled().len(), 3);

        assert!(scheduler.cancel(&key("h2", "12:00")));
        assert!(!scheduler.cancel(&key("h2", "12:00")));
        assert_eq!(scheduler.cancel_entity("h1"), 2);
        assert!(scheduler.scheduled().is_empty());

        scheduler.schedule_all(&[habit("h3", "12:00")]);
        assert_eq!(scheduler.cancel_all(), 1);
        assert_eq!(scheduler.next_fire_at(), None);
    }

    #[test]
    fn test_fired_event_is_broadcast() {
        let (scheduler, _, clock) = harness(tue(10, 0));
        let mut events = scheduler.subscribe();
        scheduler.schedule_all(&[habit("h1", "12:00")]);

        clock.set(tue(12, 1));
        scheduler.fire_due();

        match events.try_recv().unwrap() {
            ReminderEvent::Fired { key: k, fire_at, report, .. } => {
                assert_eq!(k, key("h1", "12:00"));
                assert_eq!(fire_at, tue(12, 0));
                assert!(report.notification_shown);
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_test_notification_bypasses_registry() {
        let (scheduler, notifier, _) = harness(tue(10, 0));
        let report = scheduler.send_test_notification();

        assert!(report.notification_shown);
        assert!(report.in_app_alert);
        assert_eq!(notifier.shown()[0].tag, "reminder-test");
        assert!(scheduler.scheduled().is_empty());
    }

    #[test]
    fn test_open_interaction_emits_navigation() {
        let (scheduler, notifier, _) = harness(tue(10, 0));
        let mut events = scheduler.subscribe();

        scheduler
            .handle_interaction(&Interaction {
                tag: "reminder-h1-12:00".to_string(),
                entity_id: "h1".to_string(),
                action: NotificationAction::Open,
            })
            .unwrap();

        assert_eq!(notifier.closed(), vec!["reminder-h1-12:00".to_string()]);
        assert_eq!(
            events.try_recv().unwrap(),
            ReminderEvent::OpenCompletion {
                entity_id: "h1".to_string(),
                url: "/habits/h1/complete".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_request_permission_through_scheduler() {
        let notifier = Arc::new(RecordingNotifier::new());
        let settings = Arc::new(SettingsStore::load(Arc::new(MemoryStore::new())));
        let clock = Arc::new(ManualClock::new(tue(10, 0)));
        let scheduler = ReminderScheduler::new(notifier.clone(), settings, clock, SchedulerOptions::default());

        assert_eq!(scheduler.permission_status(), PermissionState::Unknown);
        assert!(scheduler.request_permission().await);
        assert_eq!(scheduler.permission_status(), PermissionState::Granted);
    }

    #[tokio::test]
    async fn test_run_loop_fires_and_stops() {
        let (scheduler, notifier, clock) = harness(tue(10, 0));
        scheduler.schedule_all(&[habit("h1", "12:00")]);
        clock.set(tue(12, 0));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let handle = tokio::spawn(scheduler.clone().run(shutdown_rx));

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(notifier.shown().len(), 1);

        shutdown_tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), handle)
            .await
            .unwrap()
            .unwrap();
    }
}
