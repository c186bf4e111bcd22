use std::sync::Arc;

use async_trait::async_trait;
use fleetcron_core::settings::{jobs, keys};
use fleetcron_core::CronExpression;

use super::effects::ReminderDispatcher;
use crate::error::JobError;
use crate::job::{CronJob, ScheduleSettings};
use crate::settings::SettingsReader;

pub const NAME: &str = jobs::TRIP_REMINDER;

/// 12:00 every day.
pub const DEFAULT_SCHEDULE: CronExpression = CronExpression::daily_at(12, 0);

const SCHEDULE_SETTINGS: ScheduleSettings = ScheduleSettings {
    time_key: keys::TRIP_REMINDER_TIME,
    schedule_type_key: None,
};

/// Daily reminder to passengers travelling tomorrow.
pub struct TripReminderJob {
    settings: Arc<dyn SettingsReader>,
    dispatcher: Arc<dyn ReminderDispatcher>,
    schedule: CronExpression,
}

impl TripReminderJob {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsReader>, dispatcher: Arc<dyn ReminderDispatcher>) -> Self {
        Self {
            settings,
            dispatcher,
            schedule: DEFAULT_SCHEDULE,
        }
    }
}

#[async_trait]
impl CronJob for TripReminderJob {
    fn name(&self) -> &str {
        NAME
    }

    fn schedule(&self) -> CronExpression {
        self.schedule
    }

    fn set_schedule(&mut self, schedule: CronExpression) {
        self.schedule = schedule;
    }

    async fn initialize(&mut self) {
        let settings = Arc::clone(&self.settings);
        self.update_schedule(settings.as_ref()).await;
    }

    async fn update_schedule(&mut self, scope: &dyn SettingsReader) {
        self.schedule = SCHEDULE_SETTINGS.derive(NAME, scope, self.schedule).await;
    }

    async fn run(&self) -> Result<(), JobError> {
        let sent = self.dispatcher.send_trip_reminders().await?;
        if sent == 0 {
            tracing::info!(job = NAME, "scheduler: no trips departing tomorrow; nothing to remind");
        } else {
            tracing::info!(job = NAME, sent, "scheduler: trip reminders sent");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::RecordingEffects;
    use crate::settings::MemorySettings;

    #[tokio::test]
    async fn update_schedule_reads_time_only() {
        let effects = Arc::new(RecordingEffects::default());
        let mut job = TripReminderJob::new(Arc::new(MemorySettings::new()), effects);
        assert_eq!(job.schedule(), DEFAULT_SCHEDULE);

        let scope = MemorySettings::with_values([(keys::TRIP_REMINDER_TIME, "8:05")]);
        job.update_schedule(&scope).await;

        assert_eq!(job.schedule().to_string(), "5 8 * * *");
    }

    #[tokio::test]
    async fn run_dispatches_reminders() {
        let effects = Arc::new(RecordingEffects::default());
        let job = TripReminderJob::new(
            Arc::new(MemorySettings::new()),
            Arc::clone(&effects) as Arc<dyn ReminderDispatcher>,
        );

        job.run().await.unwrap();
        job.run().await.unwrap();

        assert_eq!(effects.reminder_calls(), 2);
    }
}
