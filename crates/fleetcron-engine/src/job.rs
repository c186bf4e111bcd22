//! The contract every scheduled job implements.

use async_trait::async_trait;
use chrono_tz::Tz;
use fleetcron_core::{
    build_cron_expression, parse_schedule_type, parse_time_value, CronExpression, ScheduleType,
};

use crate::error::JobError;
use crate::settings::SettingsReader;

/// A named unit of recurring work.
///
/// Construction is two-phase: a factory builds the job with its compiled-in
/// default schedule, then the orchestrator awaits [`CronJob::initialize`]
/// before arming it, so a job is never armed with a stale default.
#[async_trait]
pub trait CronJob: Send + Sync {
    /// Stable identity; equal to the name the job is registered under.
    fn name(&self) -> &str;

    /// Current schedule. Armed in its six-field form.
    fn schedule(&self) -> CronExpression;

    /// Replace the schedule without reading settings. A rebuilt instance is
    /// seeded with its predecessor's schedule this way, so a bad value in
    /// the next derivation keeps the last-known-good schedule.
    fn set_schedule(&mut self, schedule: CronExpression);

    /// Per-job timezone override. `None` uses the orchestrator default.
    fn timezone(&self) -> Option<Tz> {
        None
    }

    /// Derive the first schedule from the job's own settings gateway.
    async fn initialize(&mut self);

    /// Re-derive the schedule from `scope`.
    ///
    /// Never fails: missing settings or a gateway error keep the last-known
    /// schedule, and an invalid value is logged and ignored.
    async fn update_schedule(&mut self, scope: &dyn SettingsReader);

    async fn run(&self) -> Result<(), JobError>;
}

/// Which settings a job's schedule is derived from.
#[derive(Debug, Clone, Copy)]
pub struct ScheduleSettings {
    pub time_key: &'static str,
    /// Weekday selector; `None` means the job always runs daily.
    pub schedule_type_key: Option<&'static str>,
}

impl ScheduleSettings {
    /// Derive a schedule for `job`, falling back to `current` on any problem.
    pub async fn derive(
        &self,
        job: &str,
        scope: &dyn SettingsReader,
        current: CronExpression,
    ) -> CronExpression {
        match self.read(scope).await {
            Ok(Some(expression)) => {
                tracing::info!(
                    job,
                    schedule = %expression,
                    "scheduler: loaded schedule from settings"
                );
                expression
            }
            Ok(None) => {
                tracing::info!(
                    job,
                    schedule = %current,
                    "scheduler: schedule settings absent; keeping current schedule"
                );
                current
            }
            Err(e) => {
                tracing::warn!(
                    job,
                    schedule = %current,
                    error = %e,
                    "scheduler: could not derive schedule; keeping current schedule"
                );
                current
            }
        }
    }

    async fn read(&self, scope: &dyn SettingsReader) -> Result<Option<CronExpression>, JobError> {
        let Some(time) = scope.get_by_key(self.time_key).await? else {
            return Ok(None);
        };
        let time = parse_time_value(&time.value)?;

        let schedule = match self.schedule_type_key {
            None => ScheduleType::Daily,
            Some(key) => match scope.get_by_key(key).await? {
                Some(setting) => parse_schedule_type(&setting.value)?,
                None => return Ok(None),
            },
        };

        Ok(Some(build_cron_expression(time, schedule)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SettingsError;
    use crate::settings::{MemorySettings, Setting};

    const WEEKLY: ScheduleSettings = ScheduleSettings {
        time_key: "job_time",
        schedule_type_key: Some("job_schedule"),
    };

    const DAILY: ScheduleSettings = ScheduleSettings {
        time_key: "job_time",
        schedule_type_key: None,
    };

    const DEFAULT: CronExpression = CronExpression::daily_at(23, 0);

    struct BrokenSettings;

    #[async_trait]
    impl SettingsReader for BrokenSettings {
        async fn get_by_key(&self, _key: &str) -> Result<Option<Setting>, SettingsError> {
            Err(SettingsError::Unavailable("connection reset".to_string()))
        }
    }

    #[tokio::test]
    async fn derives_weekly_schedule() {
        let settings =
            MemorySettings::with_values([("job_time", "06:15"), ("job_schedule", "Friday")]);
        let derived = WEEKLY.derive("job", &settings, DEFAULT).await;
        assert_eq!(derived.to_string(), "15 6 * * 5");
    }

    #[tokio::test]
    async fn daily_job_ignores_schedule_type() {
        let settings =
            MemorySettings::with_values([("job_time", "06:15"), ("job_schedule", "Friday")]);
        let derived = DAILY.derive("job", &settings, DEFAULT).await;
        assert_eq!(derived.to_string(), "15 6 * * *");
    }

    #[tokio::test]
    async fn missing_time_keeps_current() {
        let settings = MemorySettings::with_values([("job_schedule", "monday")]);
        let current = CronExpression::daily_at(4, 30);
        assert_eq!(WEEKLY.derive("job", &settings, current).await, current);
    }

    #[tokio::test]
    async fn missing_schedule_type_keeps_current() {
        let settings = MemorySettings::with_values([("job_time", "06:15")]);
        assert_eq!(WEEKLY.derive("job", &settings, DEFAULT).await, DEFAULT);
    }

    #[tokio::test]
    async fn invalid_values_keep_current() {
        let bad_time = MemorySettings::with_values([("job_time", "25:00")]);
        assert_eq!(DAILY.derive("job", &bad_time, DEFAULT).await, DEFAULT);

        let bad_type =
            MemorySettings::with_values([("job_time", "06:15"), ("job_schedule", "funday")]);
        assert_eq!(WEEKLY.derive("job", &bad_type, DEFAULT).await, DEFAULT);
    }

    #[tokio::test]
    async fn gateway_failure_keeps_current() {
        assert_eq!(DAILY.derive("job", &BrokenSettings, DEFAULT).await, DEFAULT);
    }
}
