use std::sync::Arc;

use async_trait::async_trait;
use fleetcron_core::settings::{jobs, keys};
use fleetcron_core::CronExpression;

use super::effects::TripOptimizer;
use crate::error::JobError;
use crate::job::{CronJob, ScheduleSettings};
use crate::settings::SettingsReader;

pub const NAME: &str = jobs::TRIP_OPTIMIZE;

/// 23:00 every day.
pub const DEFAULT_SCHEDULE: CronExpression = CronExpression::daily_at(23, 0);

const SCHEDULE_SETTINGS: ScheduleSettings = ScheduleSettings {
    time_key: keys::TRIP_OPTIMIZER_TIME,
    schedule_type_key: Some(keys::TRIP_OPTIMIZER_SCHEDULE),
};

/// Nightly (or weekly) trip re-planning.
pub struct TripOptimizeJob {
    settings: Arc<dyn SettingsReader>,
    optimizer: Arc<dyn TripOptimizer>,
    schedule: CronExpression,
}

impl TripOptimizeJob {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsReader>, optimizer: Arc<dyn TripOptimizer>) -> Self {
        Self {
            settings,
            optimizer,
            schedule: DEFAULT_SCHEDULE,
        }
    }
}

#[async_trait]
impl CronJob for TripOptimizeJob {
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
        self.optimizer.optimize_trips().await?;
        tracing::info!(job = NAME, "scheduler: trip optimization finished");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::RecordingEffects;
    use crate::settings::MemorySettings;

    fn job(settings: MemorySettings, effects: &Arc<RecordingEffects>) -> TripOptimizeJob {
        TripOptimizeJob::new(Arc::new(settings), Arc::clone(effects) as Arc<dyn TripOptimizer>)
    }

    #[tokio::test]
    async fn starts_on_default_schedule() {
        let effects = Arc::new(RecordingEffects::default());
        let mut job = job(MemorySettings::new(), &effects);
        assert_eq!(job.schedule().to_string(), "0 23 * * *");

        job.initialize().await;
        assert_eq!(job.schedule(), DEFAULT_SCHEDULE);
    }

    #[tokio::test]
    async fn initialize_reads_time_and_weekday() {
        let effects = Arc::new(RecordingEffects::default());
        let settings = MemorySettings::with_values([
            (keys::TRIP_OPTIMIZER_TIME, "22:15"),
            (keys::TRIP_OPTIMIZER_SCHEDULE, "sunday"),
        ]);
        let mut job = job(settings, &effects);

        job.initialize().await;

        assert_eq!(job.schedule().to_string(), "15 22 * * 0");
        assert_eq!(job.schedule().with_seconds(), "0 15 22 * * SUN");
    }

    #[tokio::test]
    async fn run_calls_optimizer() {
        let effects = Arc::new(RecordingEffects::default());
        let job = job(MemorySettings::new(), &effects);

        job.run().await.unwrap();

        assert_eq!(effects.optimize_calls(), 1);
    }

    #[tokio::test]
    async fn run_surfaces_optimizer_failure() {
        let effects = Arc::new(RecordingEffects::failing());
        let job = job(MemorySettings::new(), &effects);

        let err = job.run().await.unwrap_err();

        assert!(matches!(err, JobError::Effect(_)));
    }
}
