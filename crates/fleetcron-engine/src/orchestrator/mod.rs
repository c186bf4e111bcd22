//! Owns every armed timer and the overlap guard.
//!
//! Control operations (`init`, `restart`, `enable`, `disable`, `stop_all`)
//! are serialized by one async lock over the instance and timer maps. Timer
//! callbacks never take that lock: each armed timer captures its own job
//! instance and the shared [`RunningSet`].

mod running;
mod timers;

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Instant;

use chrono_tz::Tz;
use fleetcron_core::{CronExpression, EnabledFallback, DEFAULT_TIMEZONE};
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler};
use uuid::Uuid;

use crate::error::EngineError;
use crate::job::CronJob;
use crate::registry::{JobRegistration, JobRegistry};
use crate::settings::SettingsReader;

pub use running::{RunGuard, RunningSet};
pub use timers::Timers;

type TickFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

/// What became of one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Completed,
    Failed,
    /// A previous run of the same job was still in flight.
    Skipped,
    /// Only returned by [`Orchestrator::trigger`]: the job has no timer.
    NotArmed,
}

struct ArmedJob {
    id: Uuid,
    job: Arc<dyn CronJob>,
}

#[derive(Default)]
struct State {
    /// One live instance per registered name, armed or not.
    instances: HashMap<String, Arc<dyn CronJob>>,
    armed: HashMap<String, ArmedJob>,
}

pub struct Orchestrator {
    timers: Arc<dyn Timers>,
    registry: JobRegistry,
    settings: Arc<dyn SettingsReader>,
    default_timezone: Tz,
    enabled_fallback: EnabledFallback,
    state: Mutex<State>,
    running: Arc<RunningSet>,
}

impl Orchestrator {
    /// `timers` is usually a started [`JobScheduler`]. `settings` is the
    /// default configuration scope, used by `init` for the enabled-flag
    /// check.
    #[must_use]
    pub fn new(
        timers: impl Timers + 'static,
        registry: JobRegistry,
        settings: Arc<dyn SettingsReader>,
    ) -> Self {
        Self {
            timers: Arc::new(timers),
            registry,
            settings,
            default_timezone: DEFAULT_TIMEZONE,
            enabled_fallback: EnabledFallback::default(),
            state: Mutex::new(State::default()),
            running: Arc::new(RunningSet::default()),
        }
    }

    /// Timezone for jobs that do not carry their own. Defaults to
    /// [`DEFAULT_TIMEZONE`].
    #[must_use]
    pub fn with_default_timezone(mut self, timezone: Tz) -> Self {
        self.default_timezone = timezone;
        self
    }

    /// What a missing or unreadable enabled flag resolves to.
    #[must_use]
    pub fn with_enabled_fallback(mut self, fallback: EnabledFallback) -> Self {
        self.enabled_fallback = fallback;
        self
    }

    /// Arm every enabled job from scratch.
    ///
    /// Safe on a cold or warm process: existing timers are stopped first.
    /// Jobs are initialized one after another in registration order, and a
    /// job that fails to arm is logged without stopping the others.
    pub async fn init(&self) {
        let mut state = self.state.lock().await;
        self.stop_all_locked(&mut state).await;
        state.instances.clear();

        for registration in self.registry.iter() {
            let name = registration.name();
            let mut job = registration.instantiate();
            job.initialize().await;
            let job: Arc<dyn CronJob> = Arc::from(job);
            state.instances.insert(name.to_string(), Arc::clone(&job));

            if !self.is_enabled(registration, self.settings.as_ref()).await {
                tracing::info!(job = name, "scheduler: job disabled; not arming");
                continue;
            }

            if let Err(e) = self.arm(&mut state, job).await {
                tracing::error!(job = name, error = %e, "scheduler: failed to arm job");
            }
        }

        tracing::info!(
            registered = self.registry.len(),
            armed = state.armed.len(),
            "scheduler: initialized"
        );
    }

    /// Rebuild `name` from `scope` and re-arm it if it is enabled there.
    ///
    /// The new instance starts from the current instance's schedule, so a
    /// malformed or absent value in `scope` keeps the last-known-good one.
    /// Clears any running-set entry for the job so a stuck run cannot
    /// suppress the new timer.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownJob`] (leaving every timer untouched) if
    /// `name` is not registered, or [`EngineError::Scheduler`] if the timer
    /// library rejects the disarm or arm.
    pub async fn restart(&self, name: &str, scope: &dyn SettingsReader) -> Result<(), EngineError> {
        let registration = self.registration(name)?;
        let mut state = self.state.lock().await;

        self.disarm(&mut state, name).await?;
        if self.running.clear(name) {
            tracing::warn!(job = name, "scheduler: cleared in-flight run on restart");
        }

        let job = Self::build(&state, registration, scope).await;
        state.instances.insert(name.to_string(), Arc::clone(&job));

        if self.is_enabled(registration, scope).await {
            self.arm(&mut state, job).await?;
        } else {
            tracing::info!(job = name, "scheduler: restarted job is disabled; not arming");
        }
        Ok(())
    }

    /// Arm `name` with a schedule derived from `scope`, falling back to the
    /// schedule it had when disabled. No-op if already armed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownJob`] if `name` is not registered, or
    /// [`EngineError::Scheduler`] if the timer cannot be created.
    pub async fn enable(&self, name: &str, scope: &dyn SettingsReader) -> Result<(), EngineError> {
        let registration = self.registration(name)?;
        let mut state = self.state.lock().await;

        if state.armed.contains_key(name) {
            tracing::debug!(job = name, "scheduler: job already armed; enable is a no-op");
            return Ok(());
        }

        let job = Self::build(&state, registration, scope).await;
        state.instances.insert(name.to_string(), Arc::clone(&job));
        self.arm(&mut state, job).await
    }

    /// Disarm `name` and clear its running-set entry. No-op if not armed.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::UnknownJob`] if `name` is not registered, or
    /// [`EngineError::Scheduler`] if the timer library rejects the removal.
    pub async fn disable(&self, name: &str) -> Result<(), EngineError> {
        self.registration(name)?;
        let mut state = self.state.lock().await;

        if !self.disarm(&mut state, name).await? {
            tracing::info!(job = name, "scheduler: job already disabled");
        }
        self.running.clear(name);
        Ok(())
    }

    /// Disarm every timer. Returns the number of timers stopped; a timer the
    /// library fails to remove stays armed.
    pub async fn stop_all(&self) -> usize {
        let mut state = self.state.lock().await;
        self.stop_all_locked(&mut state).await
    }

    /// Disarm every timer, then stop the timer library itself.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Scheduler`] if the timer library fails to stop.
    pub async fn shutdown(&self) -> Result<(), EngineError> {
        let stopped = self.stop_all().await;
        self.timers.shutdown().await?;
        tracing::info!(stopped, "scheduler: shut down");
        Ok(())
    }

    /// Fire one tick of `name` now, through the same overlap guard as its
    /// timer.
    pub async fn trigger(&self, name: &str) -> TickOutcome {
        let job = {
            let state = self.state.lock().await;
            state.armed.get(name).map(|armed| Arc::clone(&armed.job))
        };
        match job {
            Some(job) => run_guarded(&self.running, job.as_ref()).await,
            None => TickOutcome::NotArmed,
        }
    }

    /// Names of armed jobs, sorted.
    pub async fn armed_jobs(&self) -> Vec<String> {
        let state = self.state.lock().await;
        let mut names: Vec<String> = state.armed.keys().cloned().collect();
        names.sort();
        names
    }

    #[must_use]
    pub fn default_timezone(&self) -> Tz {
        self.default_timezone
    }

    pub async fn is_armed(&self, name: &str) -> bool {
        self.state.lock().await.armed.contains_key(name)
    }

    #[must_use]
    pub fn is_running(&self, name: &str) -> bool {
        self.running.contains(name)
    }

    /// Schedule of the live instance, armed or not. `None` before `init` or
    /// for an unregistered name.
    pub async fn current_schedule(&self, name: &str) -> Option<CronExpression> {
        let state = self.state.lock().await;
        state.instances.get(name).map(|job| job.schedule())
    }

    fn registration(&self, name: &str) -> Result<&JobRegistration, EngineError> {
        self.registry
            .get(name)
            .ok_or_else(|| EngineError::UnknownJob(name.to_string()))
    }

    /// A fresh instance of `registration`, seeded with the live instance's
    /// schedule and then re-derived from `scope`. The live instance is left
    /// untouched: an armed timer keeps firing the one it captured.
    async fn build(
        state: &State,
        registration: &JobRegistration,
        scope: &dyn SettingsReader,
    ) -> Arc<dyn CronJob> {
        let mut job = registration.instantiate();
        if let Some(current) = state.instances.get(registration.name()) {
            job.set_schedule(current.schedule());
        }
        job.update_schedule(scope).await;
        Arc::from(job)
    }

    async fn is_enabled(&self, registration: &JobRegistration, scope: &dyn SettingsReader) -> bool {
        let Some(key) = registration.enabled_key() else {
            return true;
        };
        let fallback = self.enabled_fallback.as_bool();

        match scope.get_by_key(key).await {
            Ok(Some(setting)) => setting.value == "true",
            Ok(None) => {
                tracing::warn!(
                    job = registration.name(),
                    key,
                    enabled = fallback,
                    "scheduler: enabled flag missing; applying fallback"
                );
                fallback
            }
            Err(e) => {
                tracing::error!(
                    job = registration.name(),
                    key,
                    enabled = fallback,
                    error = %e,
                    "scheduler: failed to read enabled flag; applying fallback"
                );
                fallback
            }
        }
    }

    async fn arm(&self, state: &mut State, job: Arc<dyn CronJob>) -> Result<(), EngineError> {
        let name = job.name().to_string();
        self.disarm(state, &name).await?;

        let schedule = job.schedule();
        let cron = schedule.with_seconds();
        let timezone = job.timezone().unwrap_or(self.default_timezone);

        let timer = Job::new_async_tz(
            cron.as_str(),
            timezone,
            tick_handler(Arc::clone(&self.running), Arc::clone(&job)),
        )?;

        let id = self.timers.add(timer).await?;
        state.armed.insert(name.clone(), ArmedJob { id, job });

        tracing::info!(
            job = %name,
            action = "arm",
            schedule = %schedule.describe(),
            cron = %cron,
            timezone = %timezone,
            "scheduler: armed job"
        );
        Ok(())
    }

    /// Returns whether a timer was removed. The handle is dropped only once
    /// the timer library has removed the timer.
    async fn disarm(&self, state: &mut State, name: &str) -> Result<bool, EngineError> {
        let Some(id) = state.armed.get(name).map(|armed| armed.id) else {
            return Ok(false);
        };
        self.timers.remove(&id).await?;
        state.armed.remove(name);
        tracing::info!(job = name, action = "disarm", "scheduler: disarmed job");
        Ok(true)
    }

    async fn stop_all_locked(&self, state: &mut State) -> usize {
        let armed: Vec<(String, Uuid)> = state
            .armed
            .iter()
            .map(|(name, armed)| (name.clone(), armed.id))
            .collect();

        let mut stopped = 0;
        for (name, id) in armed {
            match self.timers.remove(&id).await {
                Ok(()) => {
                    state.armed.remove(&name);
                    stopped += 1;
                    tracing::info!(job = %name, action = "disarm", "scheduler: disarmed job");
                }
                Err(e) => {
                    tracing::error!(job = %name, error = %e, "scheduler: failed to disarm job");
                }
            }
        }
        stopped
    }
}

/// The callback an armed timer fires. It holds its own handles, never the
/// orchestrator lock.
fn tick_handler(
    running: Arc<RunningSet>,
    job: Arc<dyn CronJob>,
) -> impl FnMut(Uuid, JobScheduler) -> TickFuture + Send + Sync + 'static {
    move |_uuid, _lock| -> TickFuture {
        let running = Arc::clone(&running);
        let job = Arc::clone(&job);

        Box::pin(async move {
            run_guarded(&running, job.as_ref()).await;
        })
    }
}

/// One tick: skip if `job` is already running, otherwise run it and log the
/// outcome with its duration. Failures are reported here and never
/// propagate.
async fn run_guarded(running: &RunningSet, job: &dyn CronJob) -> TickOutcome {
    let name = job.name();
    let Some(_guard) = running.try_begin(name) else {
        tracing::warn!(job = name, "scheduler: previous run still in flight; skipping tick");
        return TickOutcome::Skipped;
    };

    tracing::info!(job = name, "scheduler: starting run");
    let started = Instant::now();
    let result = job.run().await;
    let elapsed_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);

    match result {
        Ok(()) => {
            tracing::info!(job = name, elapsed_ms, "scheduler: run complete");
            TickOutcome::Completed
        }
        Err(e) => {
            tracing::error!(job = name, elapsed_ms, error = %e, "scheduler: run failed");
            TickOutcome::Failed
        }
    }
}
