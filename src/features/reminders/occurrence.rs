//! # Occurrence Calculator
//!
//! Pure weekday arithmetic: the next instant a rule should fire. This is the
//! only place in the engine that walks the calendar.
//!
//! - **Version**: 1.1.0
//! - **Since**: 0.1.0
//!
//! ## Changelog
//! - 1.1.0: Active days are matched against the lead-adjusted firing instant
//! - 1.0.0: Initial release

use chrono::{Datelike, Duration, NaiveDateTime};

use super::model::{TimeOfDay, WeekdaySet};

/// Lead time is capped at one day so the candidate window stays bounded
pub const MAX_LEAD_MINUTES: u32 = 24 * 60;

/// Earliest instant strictly after `now` at `time_of_day - lead_minutes` on an active day.
///
/// Active days refer to the day the reminder actually fires, after the lead is
/// subtracted: a Monday-only 00:05 rule with a 10 minute lead fires Monday at
/// 23:55. Returns `None` when `active_days` is empty.
pub fn next_occurrence(
    time_of_day: TimeOfDay,
    active_days: WeekdaySet,
    lead_minutes: u32,
    now: NaiveDateTime,
) -> Option<NaiveDateTime> {
    if active_days.is_empty() {
        return None;
    }

    let lead = Duration::minutes(lead_minutes.min(MAX_LEAD_MINUTES) as i64);
    let today = now.date();

    // A lead can pull a slot onto the previous day, so look one day past a week
    (0..=8)
        .filter_map(|offset| today.checked_add_signed(Duration::days(offset)))
        .map(|day| day.and_time(time_of_day.as_naive_time()) - lead)
        .filter(|candidate| active_days.contains(candidate.weekday()))
        .find(|candidate| *candidate > now)
}
