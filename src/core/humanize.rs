//! # Human-Readable Durations
//!
//! Shorthand duration parsing ("10m", "1h30m") and relative labels for
//! upcoming reminders.
//!
//! - **Version**: 1.0.0
//! - **Since**: 0.3.0

/// Parse a shorthand duration like "30m", "2h", "1d" or "1h30m" into whole minutes.
///
/// Seconds are accepted but rounded up to the next minute. A bare number is
/// read as minutes.
pub fn parse_duration_minutes(input: &str) -> Option<u32> {
    let input = input.trim().to_lowercase();
    if input.is_empty() {
        return None;
    }
    if let Ok(minutes) = input.parse::<u32>() {
        return (minutes > 0).then_some(minutes);
    }

    let mut total_seconds: u64 = 0;
    let mut current_number = String::new();

    for c in input.chars() {
        if c.is_ascii_digit() {
            current_number.push(c);
        } else if !current_number.is_empty() {
            let value: u64 = current_number.parse().ok()?;
            current_number.clear();

            let unit: u64 = match c {
                's' => 1,
                'm' => 60,
                'h' => 60 * 60,
                'd' => 60 * 60 * 24,
                _ => return None,
            };
            total_seconds = total_seconds.checked_add(value.checked_mul(unit)?)?;
        } else {
            return None;
        }
    }

    // Trailing digits without a unit
    if !current_number.is_empty() {
        return None;
    }

    if total_seconds == 0 {
        return None;
    }
    u32::try_from(total_seconds.div_ceil(60)).ok()
}

/// Format a duration in seconds into a human-readable string
pub fn format_duration(seconds: i64) -> String {
    if seconds < 60 {
        format!("{} second{}", seconds, plural(seconds))
    } else if seconds < 3600 {
        let mins = seconds / 60;
        format!("{} minute{}", mins, plural(mins))
    } else if seconds < 86400 {
        let hours = seconds / 3600;
        let mins = (seconds % 3600) / 60;
        if mins > 0 {
            format!("{} hour{} {} minute{}", hours, plural(hours), mins, plural(mins))
        } else {
            format!("{} hour{}", hours, plural(hours))
        }
    } else {
        let days = seconds / 86400;
        let hours = (seconds % 86400) / 3600;
        if hours > 0 {
            format!("{} day{} {} hour{}", days, plural(days), hours, plural(hours))
        } else {
            format!("{} day{}", days, plural(days))
        }
    }
}

/// Relative label for an instant `seconds` away, e.g. "in 2 hours 5 minutes"
pub fn time_until_label(seconds: i64) -> String {
    if seconds <= 0 {
        "now".to_string()
    } else if seconds < 60 {
        "in less than a minute".to_string()
    } else {
        format!("in {}", format_duration(seconds))
    }
}

fn plural(n: i64) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_minutes() {
        assert_eq!(parse_duration_minutes("10"), Some(10));
        assert_eq!(parse_duration_minutes("10m"), Some(10));
        assert_eq!(parse_duration_minutes("2h"), Some(120));
        assert_eq!(parse_duration_minutes("1h30m"), Some(90));
        assert_eq!(parse_duration_minutes("1d"), Some(1440));
        assert_eq!(parse_duration_minutes("90s"), Some(2));
        assert_eq!(parse_duration_minutes("0"), None);
        assert_eq!(parse_duration_minutes("5x"), None);
        assert_eq!(parse_duration_minutes("1h5"), None);
        assert_eq!(parse_duration_minutes("soon"), None);
        assert_eq!(parse_duration_minutes(""), None);
    }

    #[test]
    fn test_parse_duration_rejects_huge_values() {
        assert_eq!(parse_duration_minutes("99999999999999999d"), None);
        assert_eq!(parse_duration_minutes("18446744073709551615s1s"), None);
        assert_eq!(parse_duration_minutes("99999999999999999999m"), None);
        assert_eq!(parse_duration_minutes("9999999999d"), None);
    }

    #[test]
    fn test_format_duration() {
        assert_eq!(format_duration(30), "30 seconds");
        assert_eq!(format_duration(1), "1 second");
        assert_eq!(format_duration(60), "1 minute");
        assert_eq!(format_duration(120), "2 minutes");
        assert_eq!(format_duration(3600), "1 hour");
        assert_eq!(format_duration(3660), "1 hour 1 minute");
        assert_eq!(format_duration(86400), "1 day");
        assert_eq!(format_duration(90000), "1 day 1 hour");
    }

    #[test]
    fn test_time_until_label() {
        assert_eq!(time_until_label(0), "now");
        assert_eq!(time_until_label(-5), "now");
        assert_eq!(time_until_label(45), "in less than a minute");
        assert_eq!(time_until_label(7500), "in 2 hours 5 minutes");
    }
}
