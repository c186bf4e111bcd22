//! The concrete jobs and the registration table that wires them up.

mod effects;
mod fleet_api;
pub mod trip_finalize;
pub mod trip_optimize;
pub mod trip_reminder;

use std::sync::Arc;

use fleetcron_core::settings::keys;

use crate::error::EngineError;
use crate::registry::JobRegistry;
use crate::settings::SettingsReader;

pub use effects::{ReminderDispatcher, TripFinalizer, TripOptimizer};
pub use fleet_api::FleetApiClient;
pub use trip_finalize::TripFinalizeJob;
pub use trip_optimize::TripOptimizeJob;
pub use trip_reminder::TripReminderJob;

/// Collaborators the concrete jobs call out to.
#[derive(Clone)]
pub struct JobEffects {
    pub optimizer: Arc<dyn TripOptimizer>,
    pub reminders: Arc<dyn ReminderDispatcher>,
    pub finalizer: Arc<dyn TripFinalizer>,
}

impl JobEffects {
    /// Route every effect through one fleet API client.
    #[must_use]
    pub fn fleet_api(client: Arc<FleetApiClient>) -> Self {
        Self {
            optimizer: Arc::clone(&client) as Arc<dyn TripOptimizer>,
            reminders: Arc::clone(&client) as Arc<dyn ReminderDispatcher>,
            finalizer: client,
        }
    }
}

/// Register the three trip jobs in their fixed order.
///
/// # Errors
///
/// Returns [`EngineError::DuplicateJob`] if any of them is already present.
pub fn register_default_jobs(
    registry: &mut JobRegistry,
    settings: &Arc<dyn SettingsReader>,
    effects: &JobEffects,
) -> Result<(), EngineError> {
    let (s, optimizer) = (Arc::clone(settings), Arc::clone(&effects.optimizer));
    registry.register(trip_optimize::NAME, Some(keys::TRIP_OPTIMIZER_ENABLED), move || {
        Box::new(TripOptimizeJob::new(Arc::clone(&s), Arc::clone(&optimizer)))
    })?;

    let (s, reminders) = (Arc::clone(settings), Arc::clone(&effects.reminders));
    registry.register(trip_reminder::NAME, Some(keys::TRIP_REMINDER_ENABLED), move || {
        Box::new(TripReminderJob::new(Arc::clone(&s), Arc::clone(&reminders)))
    })?;

    let (s, finalizer) = (Arc::clone(settings), Arc::clone(&effects.finalizer));
    registry.register(trip_finalize::NAME, Some(keys::TRIP_FINALIZER_ENABLED), move || {
        Box::new(TripFinalizeJob::new(Arc::clone(&s), Arc::clone(&finalizer)))
    })?;

    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::{ReminderDispatcher, TripFinalizer, TripOptimizer};
    use crate::error::EffectError;

    /// Records every effect call; optionally fails all of them.
    #[derive(Default)]
    pub(crate) struct RecordingEffects {
        optimize: AtomicUsize,
        reminders: AtomicUsize,
        finalize: Mutex<Vec<u32>>,
        fail: bool,
    }

    impl RecordingEffects {
        pub(crate) fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        pub(crate) fn optimize_calls(&self) -> usize {
            self.optimize.load(Ordering::SeqCst)
        }

        pub(crate) fn reminder_calls(&self) -> usize {
            self.reminders.load(Ordering::SeqCst)
        }

        pub(crate) fn finalize_calls(&self) -> Vec<u32> {
            self.finalize.lock().unwrap().clone()
        }

        fn outcome(&self) -> Result<(), EffectError> {
            if self.fail {
                return Err(EffectError::UnexpectedStatus {
                    status: 503,
                    url: "http://fleet.test/internal/jobs".to_string(),
                });
            }
            Ok(())
        }
    }

    #[async_trait]
    impl TripOptimizer for RecordingEffects {
        async fn optimize_trips(&self) -> Result<(), EffectError> {
            self.optimize.fetch_add(1, Ordering::SeqCst);
            self.outcome()
        }
    }

    #[async_trait]
    impl ReminderDispatcher for RecordingEffects {
        async fn send_trip_reminders(&self) -> Result<usize, EffectError> {
            self.reminders.fetch_add(1, Ordering::SeqCst);
            self.outcome().map(|()| 3)
        }
    }

    #[async_trait]
    impl TripFinalizer for RecordingEffects {
        async fn finalize_trips(&self, lead_hours: u32) -> Result<usize, EffectError> {
            self.finalize.lock().unwrap().push(lead_hours);
            self.outcome().map(|()| 1)
        }
    }
}
