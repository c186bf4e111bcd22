use crate::app_config::{AppConfig, EnabledFallback, Environment, DEFAULT_TIMEZONE};
use crate::schedule::parse_timezone;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("FLEETCRON_ENV", "development"));
    let log_level = or_default("FLEETCRON_LOG_LEVEL", "info");

    let db_max_connections = parse_u32("FLEETCRON_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("FLEETCRON_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("FLEETCRON_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let (timezone_var, timezone_raw) = match lookup("FLEETCRON_TIMEZONE") {
        Ok(raw) => ("FLEETCRON_TIMEZONE", raw),
        Err(_) => ("TZ", or_default("TZ", DEFAULT_TIMEZONE.name())),
    };
    let timezone =
        parse_timezone(&timezone_raw).map_err(|e| invalid(timezone_var, e.to_string()))?;

    let enabled_fallback =
        parse_enabled_fallback(&or_default("FLEETCRON_ENABLED_FALLBACK", "enabled"))?;

    let fleet_api_url = or_default("FLEET_API_URL", "http://localhost:3000");
    let fleet_api_key = lookup("FLEET_API_KEY").ok();
    let http_timeout_secs = parse_u64("FLEETCRON_HTTP_TIMEOUT_SECS", "300")?;

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        timezone,
        enabled_fallback,
        fleet_api_url,
        fleet_api_key,
        http_timeout_secs,
    })
}

/// Parse a string into an `Environment` variant.
///
/// Unrecognized values default to `Environment::Development`.
fn parse_environment(s: &str) -> Environment {
    match s {
        "production" => Environment::Production,
        "test" => Environment::Test,
        _ => Environment::Development,
    }
}

fn parse_enabled_fallback(s: &str) -> Result<EnabledFallback, ConfigError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "enabled" | "open" => Ok(EnabledFallback::Enabled),
        "disabled" | "closed" => Ok(EnabledFallback::Disabled),
        other => Err(ConfigError::InvalidEnvVar {
            var: "FLEETCRON_ENABLED_FALLBACK".to_string(),
            reason: format!("expected 'enabled' or 'disabled', got '{other}'"),
        }),
    }
}
