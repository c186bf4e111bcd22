//! Postgres access for fleetcron: pool setup, migrations and the `settings`
//! table.

use std::time::Duration;

use fleetcron_core::AppConfig;
use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod settings;

pub use settings::{
    get_setting_by_key, seed_settings, update_setting_value, SettingRow,
    SettingSeed, DEFAULT_JOB_SETTINGS,
};

// Relative to crates/fleetcron-db/Cargo.toml; resolves to <workspace-root>/migrations/
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: 10,
            min_connections: 1,
            acquire_timeout_secs: 10,
        }
    }
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections.min(config.db_max_connections),
            acquire_timeout_secs: config.db_acquire_timeout_secs,
        }
    }
}

#[derive(Debug, Error)]
pub enum DbError {
    #[error("record not found")]
    NotFound,
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Open a pool against `database_url`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection can be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.acquire_timeout_secs))
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply pending migrations.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if any migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<(), DbError> {
    MIGRATOR.run(pool).await?;
    Ok(())
}

/// Startup sequence: connect, migrate, then insert any missing job settings.
/// Returns the pool and the number of settings seeded.
///
/// # Errors
///
/// Returns the first [`DbError`] from any step.
pub async fn prepare(config: &AppConfig) -> Result<(PgPool, u64), DbError> {
    let pool = connect_pool(&config.database_url, PoolConfig::from_app_config(config)).await?;
    run_migrations(&pool).await?;
    let seeded = seed_settings(&pool, DEFAULT_JOB_SETTINGS).await?;
    Ok((pool, seeded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_pool_is_small() {
        let config = PoolConfig::default();
        assert!(config.min_connections <= config.max_connections);
        assert_eq!(config.acquire_timeout_secs, 10);
    }
}
