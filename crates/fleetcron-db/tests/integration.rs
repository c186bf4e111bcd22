//! Offline unit tests for fleetcron-db pool configuration and row types.
//! These tests do not require a live database connection.

use fleetcron_core::{AppConfig, EnabledFallback, Environment};
use fleetcron_db::{PoolConfig, SettingRow, DEFAULT_JOB_SETTINGS};

#[test]
fn pool_config_from_app_config_uses_core_values() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Test,
        log_level: "info".to_string(),
        db_max_connections: 42,
        db_min_connections: 7,
        db_acquire_timeout_secs: 9,
        timezone: chrono_tz::UTC,
        enabled_fallback: EnabledFallback::Enabled,
        fleet_api_url: "http://localhost:3000".to_string(),
        fleet_api_key: None,
        http_timeout_secs: 300,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.max_connections, 42);
    assert_eq!(pool_config.min_connections, 7);
    assert_eq!(pool_config.acquire_timeout_secs, 9);
}

#[test]
fn pool_config_clamps_min_to_max() {
    let app_config = AppConfig {
        database_url: "postgres://example".to_string(),
        env: Environment::Development,
        log_level: "debug".to_string(),
        db_max_connections: 2,
        db_min_connections: 8,
        db_acquire_timeout_secs: 5,
        timezone: chrono_tz::Asia::Ho_Chi_Minh,
        enabled_fallback: EnabledFallback::Disabled,
        fleet_api_url: "http://localhost:3000".to_string(),
        fleet_api_key: Some("k".to_string()),
        http_timeout_secs: 300,
    };

    let pool_config = PoolConfig::from_app_config(&app_config);
    assert_eq!(pool_config.min_connections, 2);
}

/// Compile-time smoke test: confirm that [`SettingRow`] has all expected
/// fields with the correct types. No database required.
#[test]
fn setting_row_has_expected_fields() {
    use chrono::Utc;

    let row = SettingRow {
        id: 1_i64,
        key: "trip_reminder_time".to_string(),
        title: "Trip reminder time".to_string(),
        value: "12:00".to_string(),
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    };

    assert_eq!(row.key, "trip_reminder_time");
    assert!(row.description.is_none());
}

#[test]
fn default_job_settings_cover_every_job_key() {
    use fleetcron_core::settings::keys;

    for key in [
        keys::TRIP_OPTIMIZER_TIME,
        keys::TRIP_OPTIMIZER_SCHEDULE,
        keys::TRIP_OPTIMIZER_ENABLED,
        keys::TRIP_REMINDER_TIME,
        keys::TRIP_REMINDER_ENABLED,
        keys::TRIP_FINALIZER_TIME,
        keys::TRIP_FINALIZER_ENABLED,
        keys::TRIP_FINALIZER_LEAD_HOURS,
    ] {
        assert!(
            DEFAULT_JOB_SETTINGS.iter().any(|s| s.key == key),
            "missing default for {key}"
        );
    }
}
