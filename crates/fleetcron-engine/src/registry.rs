//! Explicit job registry: name → factory, populated once at startup.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::EngineError;
use crate::job::CronJob;

pub type JobFactory = Arc<dyn Fn() -> Box<dyn CronJob> + Send + Sync>;

/// One registered job: its name, the setting that enables it, and how to
/// build a fresh instance.
#[derive(Clone)]
pub struct JobRegistration {
    name: String,
    enabled_key: Option<String>,
    factory: JobFactory,
}

impl JobRegistration {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Setting holding the `"true"`/`"false"` enabled flag. Jobs without one
    /// are always armed.
    #[must_use]
    pub fn enabled_key(&self) -> Option<&str> {
        self.enabled_key.as_deref()
    }

    /// Build a fresh, uninitialized instance.
    #[must_use]
    pub fn instantiate(&self) -> Box<dyn CronJob> {
        let job = (self.factory)();
        debug_assert_eq!(job.name(), self.name, "factory built a job with another name");
        job
    }
}

/// Jobs in registration order, indexed by name.
#[derive(Clone, Default)]
pub struct JobRegistry {
    entries: Vec<JobRegistration>,
    index: HashMap<String, usize>,
}

impl JobRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a job.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateJob`] if `name` is already registered.
    pub fn register<F>(
        &mut self,
        name: &str,
        enabled_key: Option<&str>,
        factory: F,
    ) -> Result<(), EngineError>
    where
        F: Fn() -> Box<dyn CronJob> + Send + Sync + 'static,
    {
        if self.index.contains_key(name) {
            return Err(EngineError::DuplicateJob(name.to_string()));
        }
        self.index.insert(name.to_string(), self.entries.len());
        self.entries.push(JobRegistration {
            name: name.to_string(),
            enabled_key: enabled_key.map(str::to_string),
            factory: Arc::new(factory),
        });
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&JobRegistration> {
        self.index.get(name).map(|&i| &self.entries[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobRegistration> {
        self.entries.iter()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
