//! Schedule expression building.
//!
//! Converts the `(time, schedule type)` pair stored in configuration into a
//! cron-style expression. Everything here is pure: no I/O, no state.
//!
//! Two renderings exist for every [`CronExpression`]:
//!
//! - the five-field form (`{minute} {hour} * * {dow}`, Sunday = `0`) used in
//!   logs and comparisons, via [`std::fmt::Display`];
//! - the six-field form with a leading `0` seconds field, via
//!   [`CronExpression::with_seconds`], which is what timers are armed with.
//!   Its day-of-week field uses three-letter names (`SUN`..`SAT`) so it reads
//!   the same under every cron dialect.

use std::fmt;
use std::sync::LazyLock;

use chrono::{NaiveTime, Weekday};
use chrono_tz::Tz;
use regex::Regex;
use thiserror::Error;

static TIME_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([01]?[0-9]|2[0-3]):([0-5][0-9])$").expect("valid time-of-day regex")
});

/// Malformed schedule configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid time format: {value:?}; expected HH:mm (24-hour)")]
    InvalidTime { value: String },

    #[error(
        "invalid schedule type: {value:?}; expected one of: daily, sunday, monday, \
         tuesday, wednesday, thursday, friday, saturday"
    )]
    InvalidScheduleType { value: String },

    #[error("invalid timezone: {value:?}; expected an IANA name such as Asia/Ho_Chi_Minh")]
    InvalidTimezone { value: String },
}

/// Hour and minute of a daily firing time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeOfDay {
    pub hour: u8,
    pub minute: u8,
}

/// Which days a job fires on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleType {
    Daily,
    Weekly(Weekday),
}

impl ScheduleType {
    /// The cron day-of-week field: `*` for daily, `0`–`6` otherwise (Sunday = 0).
    #[must_use]
    pub fn day_of_week_field(self) -> String {
        match self {
            ScheduleType::Daily => "*".to_string(),
            ScheduleType::Weekly(day) => day.num_days_from_sunday().to_string(),
        }
    }

    fn day_of_week_name(self) -> &'static str {
        match self {
            ScheduleType::Daily => "*",
            ScheduleType::Weekly(day) => match day {
                Weekday::Sun => "SUN",
                Weekday::Mon => "MON",
                Weekday::Tue => "TUE",
                Weekday::Wed => "WED",
                Weekday::Thu => "THU",
                Weekday::Fri => "FRI",
                Weekday::Sat => "SAT",
            },
        }
    }
}

/// A validated recurrence: one fixed time of day, every day or on one weekday.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CronExpression {
    time: TimeOfDay,
    schedule: ScheduleType,
}

impl CronExpression {
    /// Daily at `hour:minute`. Intended for compiled-in defaults; values are
    /// not range-checked.
    #[must_use]
    pub const fn daily_at(hour: u8, minute: u8) -> Self {
        Self {
            time: TimeOfDay { hour, minute },
            schedule: ScheduleType::Daily,
        }
    }

    #[must_use]
    pub fn time(&self) -> TimeOfDay {
        self.time
    }

    #[must_use]
    pub fn schedule_type(&self) -> ScheduleType {
        self.schedule
    }

    /// Six-field rendering (`0 {minute} {hour} * * {DOW}`) handed to the timer.
    #[must_use]
    pub fn with_seconds(&self) -> String {
        format!(
            "0 {} {} * * {}",
            self.time.minute,
            self.time.hour,
            self.schedule.day_of_week_name()
        )
    }

    /// Human-readable description, e.g. `At 11:00 PM, every day`.
    #[must_use]
    pub fn describe(&self) -> String {
        format_human(&self.to_string())
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} * * {}",
            self.time.minute,
            self.time.hour,
            self.schedule.day_of_week_field()
        )
    }
}

/// Parse an `H:mm` / `HH:mm` 24-hour time.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTime`] for any other shape, including a
/// single-digit minute, an hour above 23 or a minute above 59.
pub fn parse_time_value(value: &str) -> Result<TimeOfDay, ScheduleError> {
    let invalid = || ScheduleError::InvalidTime {
        value: value.to_string(),
    };

    let captures = TIME_PATTERN.captures(value).ok_or_else(invalid)?;
    let hour = captures[1].parse::<u8>().map_err(|_| invalid())?;
    let minute = captures[2].parse::<u8>().map_err(|_| invalid())?;

    Ok(TimeOfDay { hour, minute })
}

/// Parse `daily` or a weekday name, case-insensitively.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidScheduleType`] for anything outside that
/// vocabulary.
pub fn parse_schedule_type(value: &str) -> Result<ScheduleType, ScheduleError> {
    let schedule = match value.trim().to_ascii_lowercase().as_str() {
        "daily" => ScheduleType::Daily,
        "sunday" => ScheduleType::Weekly(Weekday::Sun),
        "monday" => ScheduleType::Weekly(Weekday::Mon),
        "tuesday" => ScheduleType::Weekly(Weekday::Tue),
        "wednesday" => ScheduleType::Weekly(Weekday::Wed),
        "thursday" => ScheduleType::Weekly(Weekday::Thu),
        "friday" => ScheduleType::Weekly(Weekday::Fri),
        "saturday" => ScheduleType::Weekly(Weekday::Sat),
        _ => {
            return Err(ScheduleError::InvalidScheduleType {
                value: value.to_string(),
            })
        }
    };
    Ok(schedule)
}

/// Compose a time and a schedule type into a [`CronExpression`].
#[must_use]
pub fn build_cron_expression(time: TimeOfDay, schedule: ScheduleType) -> CronExpression {
    CronExpression { time, schedule }
}

/// Parse both raw setting values and compose them.
///
/// # Errors
///
/// Returns the first [`ScheduleError`] raised by either parser.
pub fn build_cron_from_settings(
    time: &str,
    schedule_type: &str,
) -> Result<CronExpression, ScheduleError> {
    let time = parse_time_value(time)?;
    let schedule = parse_schedule_type(schedule_type)?;
    Ok(build_cron_expression(time, schedule))
}

/// Parse an IANA timezone name.
///
/// # Errors
///
/// Returns [`ScheduleError::InvalidTimezone`] if the name is unknown.
pub fn parse_timezone(value: &str) -> Result<Tz, ScheduleError> {
    value
        .trim()
        .parse::<Tz>()
        .map_err(|_| ScheduleError::InvalidTimezone {
            value: value.to_string(),
        })
}

/// Render a cron expression for logs.
///
/// Understands the five- and six-field shapes this module produces. Anything
/// else comes back verbatim; this never fails.
#[must_use]
pub fn format_human(expression: &str) -> String {
    describe(expression).unwrap_or_else(|| expression.to_string())
}

fn describe(expression: &str) -> Option<String> {
    let fields: Vec<&str> = expression.split_whitespace().collect();
    let (minute, hour, day_of_month, month, day_of_week) = match fields.as_slice() {
        [minute, hour, dom, month, dow] => (*minute, *hour, *dom, *month, *dow),
        [second, minute, hour, dom, month, dow] if *second == "0" => {
            (*minute, *hour, *dom, *month, *dow)
        }
        _ => return None,
    };

    if day_of_month != "*" || month != "*" {
        return None;
    }

    let minute = minute.parse::<u32>().ok()?;
    let hour = hour.parse::<u32>().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

    let days = if day_of_week == "*" {
        "every day".to_string()
    } else {
        format!("only on {}", weekday_label(day_of_week)?)
    };

    Some(format!("At {}, {days}", time.format("%I:%M %p")))
}

fn weekday_label(field: &str) -> Option<&'static str> {
    let label = match field.to_ascii_lowercase().as_str() {
        "0" | "7" | "sun" => "Sunday",
        "1" | "mon" => "Monday",
        "2" | "tue" => "Tuesday",
        "3" | "wed" => "Wednesday",
        "4" | "thu" => "Thursday",
        "5" | "fri" => "Friday",
        "6" | "sat" => "Saturday",
        _ => return None,
    };
    Some(label)
}
