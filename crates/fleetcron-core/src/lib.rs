//! Shared building blocks for the fleetcron workspace: schedule expression
//! building, the job setting vocabulary and process configuration.

mod app_config;
mod config;
pub mod schedule;
pub mod settings;

use thiserror::Error;

pub use app_config::{AppConfig, EnabledFallback, Environment, DEFAULT_TIMEZONE};
pub use config::{load_app_config, load_app_config_from_env};
pub use schedule::{
    build_cron_expression, build_cron_from_settings, format_human, parse_schedule_type,
    parse_time_value, parse_timezone, CronExpression, ScheduleError, ScheduleType, TimeOfDay,
};
pub use settings::{job_binding, validate_setting_value, JobAction, JobBinding, SettingValueError};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
