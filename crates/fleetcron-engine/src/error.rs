use fleetcron_core::{ScheduleError, SettingValueError};
use fleetcron_db::DbError;
use thiserror::Error;
use tokio_cron_scheduler::JobSchedulerError;

/// Failures of the configuration gateway.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("setting with key '{0}' not found")]
    NotFound(String),

    #[error("settings transaction already finished")]
    TransactionClosed,

    #[error("settings backend unavailable: {0}")]
    Unavailable(String),
}

/// Failures of orchestrator control operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The name is not in the job registry. Indicates a mismatch between the
    /// settings layer's job mapping and the registered jobs.
    #[error("job not registered: {0}")]
    UnknownJob(String),

    #[error("job registered twice: {0}")]
    DuplicateJob(String),

    #[error("timer error: {0}")]
    Scheduler(#[from] JobSchedulerError),
}

/// Failures of a job's side effects in the fleet application.
#[derive(Debug, Error)]
pub enum EffectError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid base URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

/// Anything a job's `run()` can fail with. Caught and logged by the
/// orchestrator's tick wrapper; never disarms the job.
#[derive(Debug, Error)]
pub enum JobError {
    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("required setting '{0}' is missing")]
    MissingSetting(String),

    #[error("invalid value {value:?} for setting '{key}'")]
    InvalidSetting { key: String, value: String },

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Effect(#[from] EffectError),
}

/// Failures of an administrative settings update.
#[derive(Debug, Error)]
pub enum AdminError {
    #[error(transparent)]
    InvalidValue(#[from] SettingValueError),

    #[error(transparent)]
    Settings(#[from] SettingsError),

    #[error("failed to apply setting change to job scheduling: {0}")]
    Engine(#[from] EngineError),
}
