//! Configuration gateway.
//!
//! The engine reads job settings through [`SettingsReader`]. A `&dyn
//! SettingsReader` is the configuration scope handed to `restart`/`enable`:
//! when the caller is inside a settings transaction it passes the
//! transaction, so schedule derivation sees the uncommitted write.

mod memory;
mod pg;

use async_trait::async_trait;

use crate::error::SettingsError;

pub use memory::{MemorySettings, MemoryTransaction};
pub use pg::{PgSettings, PgSettingsTransaction};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Setting {
    pub key: String,
    pub value: String,
}

impl From<fleetcron_db::SettingRow> for Setting {
    fn from(row: fleetcron_db::SettingRow) -> Self {
        Self {
            key: row.key,
            value: row.value,
        }
    }
}

#[async_trait]
pub trait SettingsReader: Send + Sync {
    /// Look up a setting. A missing key is `Ok(None)`, not an error.
    async fn get_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError>;
}

/// A settings store that supports transactional writes.
#[async_trait]
pub trait SettingsStore: SettingsReader {
    async fn begin(&self) -> Result<Box<dyn SettingsTransaction>, SettingsError>;
}

/// An open settings transaction. Reads observe its own writes. Dropping it
/// without [`SettingsTransaction::commit`] discards the writes.
#[async_trait]
pub trait SettingsTransaction: SettingsReader {
    /// Overwrite the value of an existing key.
    async fn write(&self, key: &str, value: &str) -> Result<(), SettingsError>;

    async fn commit(self: Box<Self>) -> Result<(), SettingsError>;
}
