use std::sync::Arc;

use async_trait::async_trait;
use fleetcron_core::settings::{jobs, keys};
use fleetcron_core::CronExpression;

use super::effects::TripFinalizer;
use crate::error::JobError;
use crate::job::{CronJob, ScheduleSettings};
use crate::settings::SettingsReader;

pub const NAME: &str = jobs::TRIP_FINALIZE;

/// 21:00 every day.
pub const DEFAULT_SCHEDULE: CronExpression = CronExpression::daily_at(21, 0);

const SCHEDULE_SETTINGS: ScheduleSettings = ScheduleSettings {
    time_key: keys::TRIP_FINALIZER_TIME,
    schedule_type_key: None,
};

/// Evening pass that finalizes trips departing within the configured lead
/// time.
pub struct TripFinalizeJob {
    settings: Arc<dyn SettingsReader>,
    finalizer: Arc<dyn TripFinalizer>,
    schedule: CronExpression,
}

impl TripFinalizeJob {
    #[must_use]
    pub fn new(settings: Arc<dyn SettingsReader>, finalizer: Arc<dyn TripFinalizer>) -> Self {
        Self {
            settings,
            finalizer,
            schedule: DEFAULT_SCHEDULE,
        }
    }

    /// Read at run time, not at arm time, so a lead-hours change applies to
    /// the next tick without a restart.
    async fn lead_hours(&self) -> Result<u32, JobError> {
        let key = keys::TRIP_FINALIZER_LEAD_HOURS;
        let setting = self
            .settings
            .get_by_key(key)
            .await?
            .ok_or_else(|| JobError::MissingSetting(key.to_string()))?;

        match setting.value.trim().parse::<u32>() {
            Ok(hours) if hours >= 1 => Ok(hours),
            _ => Err(JobError::InvalidSetting {
                key: key.to_string(),
                value: setting.value,
            }),
        }
    }
}

#[async_trait]
impl CronJob for TripFinalizeJob {
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
        let lead_hours = self.lead_hours().await?;
        let finalized = self.finalizer.finalize_trips(lead_hours).await?;
        tracing::info!(job = NAME, lead_hours, finalized, "scheduler: upcoming trips finalized");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::testing::RecordingEffects;
    use crate::settings::MemorySettings;

    fn job(settings: MemorySettings, effects: &Arc<RecordingEffects>) -> TripFinalizeJob {
        TripFinalizeJob::new(Arc::new(settings), Arc::clone(effects) as Arc<dyn TripFinalizer>)
    }

    #[tokio::test]
    async fn initialize_reads_finalizer_time() {
        let effects = Arc::new(RecordingEffects::default());
        let settings = MemorySettings::with_values([(keys::TRIP_FINALIZER_TIME, "20:45")]);
        let mut job = job(settings, &effects);

        job.initialize().await;

        assert_eq!(job.schedule().with_seconds(), "0 45 20 * * *");
    }

    #[tokio::test]
    async fn run_passes_lead_hours() {
        let effects = Arc::new(RecordingEffects::default());
        let settings = MemorySettings::with_values([(keys::TRIP_FINALIZER_LEAD_HOURS, "36")]);
        let job = job(settings, &effects);

        job.run().await.unwrap();

        assert_eq!(effects.finalize_calls(), [36]);
    }

    #[tokio::test]
    async fn run_picks_up_lead_hours_changes() {
        let effects = Arc::new(RecordingEffects::default());
        let settings = MemorySettings::with_values([(keys::TRIP_FINALIZER_LEAD_HOURS, "24")]);
        let job = job(settings.clone(), &effects);

        job.run().await.unwrap();
        settings.set(keys::TRIP_FINALIZER_LEAD_HOURS, "12");
        job.run().await.unwrap();

        assert_eq!(effects.finalize_calls(), [24, 12]);
    }

    #[tokio::test]
    async fn missing_lead_hours_fails_without_calling_finalizer() {
        let effects = Arc::new(RecordingEffects::default());
        let job = job(MemorySettings::new(), &effects);

        let err = job.run().await.unwrap_err();

        assert!(matches!(err, JobError::MissingSetting(ref k) if k == keys::TRIP_FINALIZER_LEAD_HOURS));
        assert!(effects.finalize_calls().is_empty());
    }

    #[tokio::test]
    async fn non_positive_lead_hours_is_rejected() {
        for bad in ["0", "-4", "a day"] {
            let effects = Arc::new(RecordingEffects::default());
            let settings = MemorySettings::with_values([(keys::TRIP_FINALIZER_LEAD_HOURS, bad)]);
            let job = job(settings, &effects);

            let err = job.run().await.unwrap_err();

            assert!(
                matches!(err, JobError::InvalidSetting { ref value, .. } if value == bad),
                "{bad}"
            );
        }
    }
}
