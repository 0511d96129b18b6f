//! Read-only "upcoming reminders" projection for widgets.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::model::{ReminderKey, TimeOfDay, TrackableEntity};
use super::occurrence::next_occurrence;
use crate::core::time_until_label;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingReminder {
    pub key: ReminderKey,
    pub entity_id: String,
    pub entity_title: String,
    pub time_of_day: TimeOfDay,
    pub next_fire_at: NaiveDateTime,
    pub time_until_label: String,
}

/// Next firing of every enabled rule, soonest first
pub fn project_upcoming(
    entities: &[TrackableEntity],
    lead_minutes: u32,
    now: NaiveDateTime,
) -> Vec<UpcomingReminder> {
    let mut upcoming: Vec<UpcomingReminder> = entities
        .iter()
        .flat_map(|entity| {
            entity
                .reminders
                .iter()
                .filter(|rule| rule.enabled)
                .filter_map(move |rule| {
                    let next_fire_at =
                        next_occurrence(rule.time_of_day, rule.active_days, lead_minutes, now)?;
                    Some(UpcomingReminder {
                        key: ReminderKey::new(&entity.id, rule.time_of_day),
                        entity_id: entity.id.clone(),
                        entity_title: entity.title.clone(),
                        time_of_day: rule.time_of_day,
                        next_fire_at,
                        time_until_label: time_until_label((next_fire_at - now).num_seconds()),
                    })
                })
        })
        .collect();

    upcoming.sort_by(|a, b| a.next_fire_at.cmp(&b.next_fire_at).then(a.key.cmp(&b.key)));
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::reminders::model::{ReminderRule, WeekdaySet};
    use chrono::NaiveDate;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, 2)
            .unwrap()
            .and_hms_opt(10, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_sorted_and_labelled() {
        let entities = vec![
            TrackableEntity::new("late", "Journal")
                .with_reminder(ReminderRule::daily("22:00".parse().unwrap())),
            TrackableEntity::new("soon", "Water")
                .with_reminder(ReminderRule::daily("12:05".parse().unwrap())),
            TrackableEntity::new("off", "Nope")
                .with_reminder(ReminderRule::daily("11:00".parse().unwrap()).disabled()),
            TrackableEntity::new("never", "Never").with_reminder(
                ReminderRule::daily("11:00".parse().unwrap()).on_days(WeekdaySet::EMPTY),
            ),
        ];

        let upcoming = project_upcoming(&entities, 0, now());
        let ids: Vec<&str> = upcoming.iter().map(|u| u.entity_id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "late"]);
        assert_eq!(upcoming[0].time_until_label, "in 2 hours 5 minutes");
        assert_eq!(upcoming[1].time_until_label, "in 12 hours");
    }

    #[test]
    fn test_lead_minutes_shift_projection() {
        let entities = vec![TrackableEntity::new("h1", "Walk")
            .with_reminder(ReminderRule::daily("10:30".parse().unwrap()))];

        let upcoming = project_upcoming(&entities, 20, now());
        assert_eq!(upcoming[0].time_until_label, "in 10 minutes");
    }
}
