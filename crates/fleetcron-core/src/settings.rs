//! Setting keys consumed by the scheduled jobs and the rules for writing them.

use thiserror::Error;

use crate::schedule::{parse_schedule_type, parse_time_value};

/// Keys of the `settings` table that drive job scheduling.
pub mod keys {
    pub const TRIP_OPTIMIZER_TIME: &str = "trip_optimizer_time";
    pub const TRIP_OPTIMIZER_SCHEDULE: &str = "trip_optimizer_schedule";
    pub const TRIP_OPTIMIZER_ENABLED: &str = "trip_optimizer_enabled";
    pub const TRIP_REMINDER_TIME: &str = "trip_reminder_time";
    pub const TRIP_REMINDER_ENABLED: &str = "trip_reminder_enabled";
    pub const TRIP_FINALIZER_TIME: &str = "trip_finalizer_time";
    pub const TRIP_FINALIZER_ENABLED: &str = "trip_finalizer_enabled";
    pub const TRIP_FINALIZER_LEAD_HOURS: &str = "trip_finalizer_lead_hours";
}

/// Registered job names.
pub mod jobs {
    pub const TRIP_OPTIMIZE: &str = "trip-optimize";
    pub const TRIP_REMINDER: &str = "trip-reminder";
    pub const TRIP_FINALIZE: &str = "schedule-upcoming-trips";
}

const BOOLEAN_KEYS: &[&str] = &[
    keys::TRIP_OPTIMIZER_ENABLED,
    keys::TRIP_REMINDER_ENABLED,
    keys::TRIP_FINALIZER_ENABLED,
];

const TIME_KEYS: &[&str] = &[
    keys::TRIP_OPTIMIZER_TIME,
    keys::TRIP_REMINDER_TIME,
    keys::TRIP_FINALIZER_TIME,
];

const SCHEDULE_KEYS: &[&str] = &[keys::TRIP_OPTIMIZER_SCHEDULE];

const POSITIVE_INTEGER_KEYS: &[&str] = &[keys::TRIP_FINALIZER_LEAD_HOURS];

/// What a change to a job-bound setting must do to the running engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobAction {
    /// Time or schedule-type change: recompute the schedule and re-arm.
    Reschedule,
    /// Enabled-flag change: arm or disarm.
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobBinding {
    pub job: &'static str,
    pub action: JobAction,
}

/// Map a setting key to the job it drives, if any.
#[must_use]
pub fn job_binding(key: &str) -> Option<JobBinding> {
    let (job, action) = match key {
        keys::TRIP_FINALIZER_TIME => (jobs::TRIP_FINALIZE, JobAction::Reschedule),
        keys::TRIP_REMINDER_TIME => (jobs::TRIP_REMINDER, JobAction::Reschedule),
        keys::TRIP_OPTIMIZER_TIME | keys::TRIP_OPTIMIZER_SCHEDULE => {
            (jobs::TRIP_OPTIMIZE, JobAction::Reschedule)
        }
        keys::TRIP_FINALIZER_ENABLED => (jobs::TRIP_FINALIZE, JobAction::Toggle),
        keys::TRIP_REMINDER_ENABLED => (jobs::TRIP_REMINDER, JobAction::Toggle),
        keys::TRIP_OPTIMIZER_ENABLED => (jobs::TRIP_OPTIMIZE, JobAction::Toggle),
        _ => return None,
    };
    Some(JobBinding { job, action })
}

/// A value rejected before it reaches the settings store.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SettingValueError {
    #[error("invalid value for setting key '{key}': must be 'true' or 'false'")]
    NotBoolean { key: String },

    #[error("invalid value for setting key '{key}': must be in HH:mm format")]
    NotTime { key: String },

    #[error(
        "invalid value for setting key '{key}': must be one of daily, monday, tuesday, \
         wednesday, thursday, friday, saturday, sunday"
    )]
    NotScheduleType { key: String },

    #[error("invalid value for setting key '{key}': must be a positive integer greater than 0")]
    NotPositiveInteger { key: String },
}

/// Validate a value against the rules for its key.
///
/// Keys without a rule are accepted unchanged.
///
/// # Errors
///
/// Returns a [`SettingValueError`] describing the expected shape.
pub fn validate_setting_value(key: &str, value: &str) -> Result<(), SettingValueError> {
    let key_owned = || key.to_string();

    if BOOLEAN_KEYS.contains(&key) && value != "true" && value != "false" {
        return Err(SettingValueError::NotBoolean { key: key_owned() });
    }

    if TIME_KEYS.contains(&key) && parse_time_value(value).is_err() {
        return Err(SettingValueError::NotTime { key: key_owned() });
    }

    if SCHEDULE_KEYS.contains(&key) && parse_schedule_type(value).is_err() {
        return Err(SettingValueError::NotScheduleType { key: key_owned() });
    }

    if POSITIVE_INTEGER_KEYS.contains(&key) && !matches!(value.parse::<u32>(), Ok(n) if n >= 1) {
        return Err(SettingValueError::NotPositiveInteger { key: key_owned() });
    }

    Ok(())
}
