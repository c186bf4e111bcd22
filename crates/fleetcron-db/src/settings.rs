//! Database operations for the `settings` table.
//!
//! Reads and writes take any Postgres executor so the same queries run
//! against the pool or inside an open transaction.

use chrono::{DateTime, Utc};
use fleetcron_core::settings::keys;
use sqlx::{PgExecutor, PgPool};

use crate::DbError;

/// A row from the `settings` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SettingRow {
    pub id: i64,
    pub key: String,
    pub title: String,
    pub value: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A default row inserted on startup when the key is absent.
#[derive(Debug, Clone, Copy)]
pub struct SettingSeed {
    pub key: &'static str,
    pub title: &'static str,
    pub value: &'static str,
    pub description: &'static str,
}

/// Defaults for every job-scheduling key, matching the compiled-in job
/// schedules.
pub const DEFAULT_JOB_SETTINGS: &[SettingSeed] = &[
    SettingSeed {
        key: keys::TRIP_OPTIMIZER_TIME,
        title: "Trip optimizer time",
        value: "23:00",
        description: "Time of day (HH:mm) the trip optimizer runs",
    },
    SettingSeed {
        key: keys::TRIP_OPTIMIZER_SCHEDULE,
        title: "Trip optimizer schedule",
        value: "daily",
        description: "daily, or the weekday the trip optimizer runs on",
    },
    SettingSeed {
        key: keys::TRIP_OPTIMIZER_ENABLED,
        title: "Trip optimizer enabled",
        value: "true",
        description: "Whether the trip optimizer runs automatically",
    },
    SettingSeed {
        key: keys::TRIP_REMINDER_TIME,
        title: "Trip reminder time",
        value: "12:00",
        description: "Time of day (HH:mm) trip reminders are sent",
    },
    SettingSeed {
        key: keys::TRIP_REMINDER_ENABLED,
        title: "Trip reminder enabled",
        value: "true",
        description: "Whether trip reminders are sent automatically",
    },
    SettingSeed {
        key: keys::TRIP_FINALIZER_TIME,
        title: "Trip finalizer time",
        value: "21:00",
        description: "Time of day (HH:mm) upcoming trips are finalized",
    },
    SettingSeed {
        key: keys::TRIP_FINALIZER_ENABLED,
        title: "Trip finalizer enabled",
        value: "true",
        description: "Whether upcoming trips are finalized automatically",
    },
    SettingSeed {
        key: keys::TRIP_FINALIZER_LEAD_HOURS,
        title: "Trip finalizer lead hours",
        value: "24",
        description: "Finalize trips departing within this many hours",
    },
];

const SETTING_COLUMNS: &str = "id, key, title, value, description, created_at, updated_at";

// No conflict target: a clash on either unique column (`key` or `title`)
// skips the seed.
const SEED_SETTING_SQL: &str = "INSERT INTO settings (key, title, value, description) \
     VALUES ($1, $2, $3, $4) \
     ON CONFLICT DO NOTHING";

/// Fetch one setting by key. Returns `Ok(None)` if the key does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_setting_by_key<'e, E>(executor: E, key: &str) -> Result<Option<SettingRow>, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, SettingRow>(&format!(
        "SELECT {SETTING_COLUMNS} FROM settings WHERE key = $1"
    ))
    .bind(key)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Overwrite the value of an existing setting and bump `updated_at`.
///
/// # Errors
///
/// Returns [`DbError::NotFound`] if no row has this key, or
/// [`DbError::Sqlx`] if the update fails.
pub async fn update_setting_value<'e, E>(
    executor: E,
    key: &str,
    value: &str,
) -> Result<SettingRow, DbError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, SettingRow>(&format!(
        "UPDATE settings SET value = $2, updated_at = NOW() WHERE key = $1 \
         RETURNING {SETTING_COLUMNS}"
    ))
    .bind(key)
    .bind(value)
    .fetch_optional(executor)
    .await?
    .ok_or(DbError::NotFound)
}

/// Insert each seed whose key and title are both unused. Existing rows are
/// never overwritten.
///
/// Returns the number of rows inserted.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn seed_settings(pool: &PgPool, seeds: &[SettingSeed]) -> Result<u64, DbError> {
    let mut inserted = 0;
    for seed in seeds {
        let result = sqlx::query(SEED_SETTING_SQL)
            .bind(seed.key)
            .bind(seed.title)
            .bind(seed.value)
            .bind(seed.description)
            .execute(pool)
            .await?;
        inserted += result.rows_affected();
    }
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use fleetcron_core::validate_setting_value;

    use super::*;

    #[test]
    fn seed_insert_skips_any_unique_conflict() {
        assert!(SEED_SETTING_SQL.ends_with("ON CONFLICT DO NOTHING"));
        assert!(!SEED_SETTING_SQL.contains("ON CONFLICT ("));
    }

    #[test]
    fn default_job_settings_pass_validation() {
        for seed in DEFAULT_JOB_SETTINGS {
            assert!(
                validate_setting_value(seed.key, seed.value).is_ok(),
                "default for {} is invalid: {}",
                seed.key,
                seed.value
            );
        }
    }

    #[test]
    fn default_job_settings_have_unique_keys_and_titles() {
        let keys: HashSet<_> = DEFAULT_JOB_SETTINGS.iter().map(|s| s.key).collect();
        let titles: HashSet<_> = DEFAULT_JOB_SETTINGS.iter().map(|s| s.title).collect();
        assert_eq!(keys.len(), DEFAULT_JOB_SETTINGS.len());
        assert_eq!(titles.len(), DEFAULT_JOB_SETTINGS.len());
    }
}
