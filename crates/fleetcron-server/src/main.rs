use std::sync::Arc;

use fleetcron_engine::{
    register_default_jobs, FleetApiClient, JobEffects, JobRegistry, Orchestrator, PgSettings,
    SettingsReader,
};
use tokio_cron_scheduler::JobScheduler;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = fleetcron_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();

    tracing::info!(
        env = ?config.env,
        timezone = %config.timezone,
        fleet_api_url = %config.fleet_api_url,
        "starting fleetcron"
    );
    if config.fleet_api_key.is_none() {
        tracing::warn!("FLEET_API_KEY is not set; fleet API calls are unauthenticated");
    }

    let (pool, seeded) = fleetcron_db::prepare(&config).await?;
    if seeded > 0 {
        tracing::info!(seeded, "inserted default job settings");
    }

    let settings: Arc<dyn SettingsReader> = Arc::new(PgSettings::new(pool.clone()));
    let client = Arc::new(FleetApiClient::from_config(&config)?);
    let mut registry = JobRegistry::new();
    register_default_jobs(&mut registry, &settings, &JobEffects::fleet_api(client))?;

    let scheduler = JobScheduler::new().await?;
    scheduler.start().await?;

    let orchestrator = Orchestrator::new(scheduler, registry, settings)
        .with_default_timezone(config.timezone)
        .with_enabled_fallback(config.enabled_fallback);
    orchestrator.init().await;

    run_until_shutdown(&orchestrator).await?;

    orchestrator.shutdown().await?;
    pool.close().await;
    Ok(())
}

/// Serve until SIGINT or SIGTERM. SIGHUP re-reads every job's settings and
/// re-arms from scratch.
#[cfg(unix)]
async fn run_until_shutdown(orchestrator: &Orchestrator) -> anyhow::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut terminate = signal(SignalKind::terminate())?;
    let mut hangup = signal(SignalKind::hangup())?;

    loop {
        tokio::select! {
            result = tokio::signal::ctrl_c() => {
                result?;
                tracing::info!("received ctrl-c, shutting down");
                return Ok(());
            }
            _ = terminate.recv() => {
                tracing::info!("received SIGTERM, shutting down");
                return Ok(());
            }
            _ = hangup.recv() => {
                tracing::info!("received SIGHUP, reloading job schedules");
                orchestrator.init().await;
            }
        }
    }
}

#[cfg(not(unix))]
async fn run_until_shutdown(_orchestrator: &Orchestrator) -> anyhow::Result<()> {
    tokio::signal::ctrl_c().await?;
    tracing::info!("received ctrl-c, shutting down");
    Ok(())
}
