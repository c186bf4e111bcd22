//! Administrative settings writes that keep the engine in step.
//!
//! A write to a job-bound key and the matching `restart`/`enable`/`disable`
//! happen inside one settings transaction: the engine derives the new
//! schedule from the uncommitted value, and the write is only committed once
//! the engine has seen it.

use std::sync::Arc;

use fleetcron_core::{job_binding, validate_setting_value, JobAction, JobBinding};

use crate::error::{AdminError, EngineError};
use crate::orchestrator::Orchestrator;
use crate::settings::{Setting, SettingsReader, SettingsStore};

pub struct SettingsAdmin {
    store: Arc<dyn SettingsStore>,
    orchestrator: Arc<Orchestrator>,
}

impl SettingsAdmin {
    #[must_use]
    pub fn new(store: Arc<dyn SettingsStore>, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            store,
            orchestrator,
        }
    }

    /// Validate and persist `value`, re-scheduling the bound job if any.
    ///
    /// The result reflects the configuration write only. A timer-library
    /// failure while applying the change is logged and the write is still
    /// committed.
    ///
    /// # Errors
    ///
    /// - [`AdminError::InvalidValue`] if `value` does not fit the key.
    /// - [`AdminError::Settings`] if the key does not exist or the store fails.
    /// - [`AdminError::Engine`] with [`EngineError::UnknownJob`] if the key is
    ///   bound to a job that is not registered; nothing is written.
    pub async fn update_setting(&self, key: &str, value: &str) -> Result<Setting, AdminError> {
        validate_setting_value(key, value)?;

        let tx = self.store.begin().await?;
        tx.write(key, value).await?;

        if let Some(binding) = job_binding(key) {
            match self.apply(binding, value, &*tx).await {
                Ok(()) => {}
                Err(e @ EngineError::UnknownJob(_)) => return Err(e.into()),
                Err(e) => {
                    tracing::error!(
                        key,
                        job = binding.job,
                        error = %e,
                        "scheduler: setting saved but job scheduling was not updated"
                    );
                }
            }
        }

        tx.commit().await?;
        tracing::info!(key, value, "scheduler: setting updated");

        Ok(Setting {
            key: key.to_string(),
            value: value.to_string(),
        })
    }

    async fn apply(
        &self,
        binding: JobBinding,
        value: &str,
        scope: &dyn SettingsReader,
    ) -> Result<(), EngineError> {
        match binding.action {
            JobAction::Reschedule => self.orchestrator.restart(binding.job, scope).await,
            JobAction::Toggle if value == "true" => {
                self.orchestrator.enable(binding.job, scope).await
            }
            JobAction::Toggle => self.orchestrator.disable(binding.job).await,
        }
    }
}
