//! # Reminder Data Model
//!
//! Trackable entities as supplied by the habit layer, their reminder rules,
//! and the registry key derived from them.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Out-of-range weekday indices are dropped instead of rejected
//! - 1.0.0: Initial release

use anyhow::{anyhow, Context, Result};
use chrono::{NaiveTime, Timelike, Weekday};
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

/// A habit or task owning reminder rules
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackableEntity {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub reward_points: i64,
    #[serde(default)]
    pub reminders: Vec<ReminderRule>,
}

/// Load a YAML list of entities (the host's habit file)
pub fn load_entities(path: &str) -> Result<Vec<TrackableEntity>> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read habits from {path}"))?;
    let entities: Vec<TrackableEntity> = serde_yaml::from_str(&contents)
        .with_context(|| format!("Invalid habits file {path}"))?;
    Ok(entities)
}

impl TrackableEntity {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        TrackableEntity {
            id: id.into(),
            title: title.into(),
            category: None,
            reward_points: 0,
            reminders: Vec::new(),
        }
    }

    pub fn with_reminder(mut self, rule: ReminderRule) -> Self {
        self.reminders.push(rule);
        self
    }
}

/// When and on which days an entity's reminder fires
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReminderRule {
    pub time_of_day: TimeOfDay,
    /// Omitted or empty means every day
    #[serde(default = "WeekdaySet::all", deserialize_with = "deserialize_active_days")]
    pub active_days: WeekdaySet,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_message: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ReminderRule {
    /// An enabled rule firing every day at `time_of_day`
    pub fn daily(time_of_day: TimeOfDay) -> Self {
        ReminderRule {
            time_of_day,
            active_days: WeekdaySet::all(),
            enabled: true,
            custom_message: None,
        }
    }

    pub fn on_days(mut self, days: WeekdaySet) -> Self {
        self.active_days = days;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.custom_message = Some(message.into());
        self
    }
}

/// Wall-clock time of day in the host's local clock
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(anyhow!("Time of day out of range: {hour:02}:{minute:02}"));
        }
        Ok(TimeOfDay { hour, minute })
    }

    /// Truncates to the minute
    pub fn from_naive(time: NaiveTime) -> Self {
        TimeOfDay {
            hour: time.hour() as u8,
            minute: time.minute() as u8,
        }
    }

    pub fn hour(&self) -> u8 {
        self.hour
    }

    pub fn minute(&self) -> u8 {
        self.minute
    }

    pub fn as_naive_time(&self) -> NaiveTime {
        NaiveTime::from_hms_opt(self.hour as u32, self.minute as u32, 0).unwrap_or(NaiveTime::MIN)
    }
}

fn time_of_day_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"^(\d{1,2}):(\d{2})(?::\d{2})?$").expect("valid regex"))
}

impl FromStr for TimeOfDay {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let captures = time_of_day_pattern()
            .captures(s.trim())
            .ok_or_else(|| anyhow!("Invalid time of day (expected HH:MM): {s:?}"))?;
        let hour: u8 = captures[1].parse()?;
        let minute: u8 = captures[2].parse()?;
        TimeOfDay::new(hour, minute)
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Set of weekdays, indexed 0 = Sunday through 6 = Saturday
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const EMPTY: WeekdaySet = WeekdaySet(0);

    pub fn all() -> Self {
        WeekdaySet(0b0111_1111)
    }

    /// Build from weekday indices, silently dropping anything outside 0..=6
    pub fn from_indices<I: IntoIterator<Item = u8>>(indices: I) -> Self {
        indices
            .into_iter()
            .filter(|&i| i <= 6)
            .fold(WeekdaySet::EMPTY, |set, i| WeekdaySet(set.0 | (1u8 << i)))
    }

    pub fn contains(&self, day: Weekday) -> bool {
        self.0 & (1u8 << day.num_days_from_sunday()) != 0
    }

    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    pub fn indices(&self) -> Vec<u8> {
        (0u8..7).filter(|&i| self.0 & (1u8 << i) != 0).collect()
    }
}

impl Serialize for WeekdaySet {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        self.indices().serialize(serializer)
    }
}

/// An empty list keeps its legacy meaning of "every day"
fn deserialize_active_days<'de, D>(deserializer: D) -> std::result::Result<WeekdaySet, D::Error>
where
    D: Deserializer<'de>,
{
    let indices = Option::<Vec<u8>>::deserialize(deserializer)?.unwrap_or_default();
    if indices.is_empty() {
        Ok(WeekdaySet::all())
    } else {
        Ok(WeekdaySet::from_indices(indices))
    }
}

/// Registry key: one per (entity, time of day)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ReminderKey(String);

impl ReminderKey {
    pub fn new(entity_id: &str, time_of_day: TimeOfDay) -> Self {
        ReminderKey(format!("reminder-{entity_id}-{time_of_day}"))
    }

    /// Tag used by the one-off test notification
    pub fn test_notification() -> Self {
        ReminderKey("reminder-test".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReminderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
