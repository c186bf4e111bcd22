use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use async_trait::async_trait;

use super::{Setting, SettingsReader, SettingsStore, SettingsTransaction};
use crate::error::SettingsError;

/// In-process settings store.
#[derive(Debug, Clone, Default)]
pub struct MemorySettings {
    values: Arc<RwLock<HashMap<String, String>>>,
}

impl MemorySettings {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_values<I, K, V>(values: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        Self {
            values: Arc::new(RwLock::new(values)),
        }
    }

    /// Write a value outside any transaction, inserting the key if needed.
    pub fn set(&self, key: &str, value: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
    }

    pub fn remove(&self, key: &str) {
        self.values
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
    }

    fn value(&self, key: &str) -> Option<String> {
        self.values
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl SettingsReader for MemorySettings {
    async fn get_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        Ok(self.value(key).map(|value| Setting {
            key: key.to_string(),
            value,
        }))
    }
}

#[async_trait]
impl SettingsStore for MemorySettings {
    async fn begin(&self) -> Result<Box<dyn SettingsTransaction>, SettingsError> {
        Ok(Box::new(MemoryTransaction {
            base: self.clone(),
            staged: Mutex::new(HashMap::new()),
        }))
    }
}

/// Staged writes over a [`MemorySettings`], applied on commit.
#[derive(Debug)]
pub struct MemoryTransaction {
    base: MemorySettings,
    staged: Mutex<HashMap<String, String>>,
}

impl MemoryTransaction {
    fn staged_value(&self, key: &str) -> Option<String> {
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }
}

#[async_trait]
impl SettingsReader for MemoryTransaction {
    async fn get_by_key(&self, key: &str) -> Result<Option<Setting>, SettingsError> {
        let value = self.staged_value(key).or_else(|| self.base.value(key));
        Ok(value.map(|value| Setting {
            key: key.to_string(),
            value,
        }))
    }
}

#[async_trait]
impl SettingsTransaction for MemoryTransaction {
    async fn write(&self, key: &str, value: &str) -> Result<(), SettingsError> {
        if self.staged_value(key).is_none() && self.base.value(key).is_none() {
            return Err(SettingsError::NotFound(key.to_string()));
        }
        self.staged
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    async fn commit(self: Box<Self>) -> Result<(), SettingsError> {
        let staged = self
            .staged
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        let mut values = self
            .base
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        values.extend(staged);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_key_reads_as_none() {
        let store = MemorySettings::new();
        assert_eq!(store.get_by_key("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn transaction_sees_own_writes_before_commit() {
        let store = MemorySettings::with_values([("trip_reminder_time", "12:00")]);
        let tx = store.begin().await.unwrap();
        tx.write("trip_reminder_time", "08:15").await.unwrap();

        let inside = tx.get_by_key("trip_reminder_time").await.unwrap().unwrap();
        let outside = store.get_by_key("trip_reminder_time").await.unwrap().unwrap();
        assert_eq!(inside.value, "08:15");
        assert_eq!(outside.value, "12:00");

        tx.commit().await.unwrap();
        let committed = store.get_by_key("trip_reminder_time").await.unwrap().unwrap();
        assert_eq!(committed.value, "08:15");
    }

    #[tokio::test]
    async fn dropped_transaction_discards_writes() {
        let store = MemorySettings::with_values([("trip_reminder_enabled", "true")]);
        {
            let tx = store.begin().await.unwrap();
            tx.write("trip_reminder_enabled", "false").await.unwrap();
        }
        let value = store.get_by_key("trip_reminder_enabled").await.unwrap().unwrap();
        assert_eq!(value.value, "true");
    }

    #[tokio::test]
    async fn writing_unknown_key_fails() {
        let store = MemorySettings::new();
        let tx = store.begin().await.unwrap();
        let err = tx.write("nope", "1").await.unwrap_err();
        assert!(matches!(err, SettingsError::NotFound(ref k) if k == "nope"));
    }
}
