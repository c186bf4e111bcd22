use async_trait::async_trait;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use uuid::Uuid;

/// The timer library as the orchestrator uses it.
#[async_trait]
pub trait Timers: Send + Sync {
    async fn add(&self, job: Job) -> Result<Uuid, JobSchedulerError>;

    async fn remove(&self, id: &Uuid) -> Result<(), JobSchedulerError>;

    async fn shutdown(&self) -> Result<(), JobSchedulerError>;
}

#[async_trait]
impl Timers for JobScheduler {
    async fn add(&self, job: Job) -> Result<Uuid, JobSchedulerError> {
        JobScheduler::add(self, job).await
    }

    async fn remove(&self, id: &Uuid) -> Result<(), JobSchedulerError> {
        JobScheduler::remove(self, id).await
    }

    async fn shutdown(&self) -> Result<(), JobSchedulerError> {
        let mut scheduler = self.clone();
        JobScheduler::shutdown(&mut scheduler).await
    }
}
