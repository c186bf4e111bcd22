//! Recurring-job orchestration: the job contract, the registry, the
//! orchestrator that arms timers with an overlap guard, the configuration
//! gateway it reads schedules through, and the trip jobs themselves.

pub mod admin;
pub mod error;
pub mod job;
pub mod jobs;
pub mod orchestrator;
pub mod registry;
pub mod settings;

pub use admin::SettingsAdmin;
pub use error::{AdminError, EffectError, EngineError, JobError, SettingsError};
pub use job::{CronJob, ScheduleSettings};
pub use jobs::{register_default_jobs, FleetApiClient, JobEffects};
pub use orchestrator::{Orchestrator, TickOutcome, Timers};
pub use registry::{JobRegistration, JobRegistry};
pub use settings::{
    MemorySettings, PgSettings, Setting, SettingsReader, SettingsStore, SettingsTransaction,
};
