use async_trait::async_trait;
use fleetcron_db::DbError;
use sqlx::{PgPool, Postgres, Transaction};
use tokio::sync::Mutex;

use super::{Setting, SettingsReader, SettingsStore, SettingsTransaction};
use crate::error::SettingsError;

/// Settings backed by the Postgres `settings` table.
#[derive(Debug, Clone)]
pub struct PgSettings {
    pool: PgPool,
}

impl PgSettings {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SettingsReader for PgSettings {
    async fn get_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let row = fleetcron_db::get_setting_by_key(&self.pool, key).await?;
        Ok(row.map(Setting::from))
    }
}

#[async_trait]
impl SettingsStore for PgSettings {
    async fn begin(&self) -> Result<Box<dyn SettingsTransaction>, SettingsError> {
        let tx = self.pool.begin().await.map_err(DbError::from)?;
        Ok(Box::new(PgSettingsTransaction {
            tx: Mutex::new(Some(tx)),
        }))
    }
}

/// An open database transaction over the `settings` table.
///
/// Rolled back by `sqlx` when dropped uncommitted.
pub struct PgSettingsTransaction {
    tx: Mutex<Option<Transaction<'static, Postgres>>>,
}

#[async_trait]
impl SettingsReader for PgSettingsTransaction {
    async fn get_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(SettingsError::TransactionClosed)?;
        let row = fleetcron_db::get_setting_by_key(&mut **tx, key).await?;
        Ok(row.map(Setting::from))
    }
}

#[async_trait]
impl SettingsTransaction for PgSettingsTransaction {
    async fn write(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        let mut guard = self.tx.lock().await;
        let tx = guard.as_mut().ok_or(SettingsError::TransactionClosed)?;
        match fleetcron_db::update_setting_value(&mut **tx, key, value).await {
            Ok(_) => Ok(()),
            Err(DbError::NotFound) => Err(SettingsError::NotFound(key.to_string())),
            Err(e) => Err(e.into()),
        }
    }

    async fn commit(self: Box<Self>) -> Result<(), SettingsError> {
        let tx = self
            .tx
            .into_inner()
            .ok_or(SettingsError::TransactionClosed)?;
        tx.commit().await.map_err(DbError::from)?;
        Ok(())
    }
}
