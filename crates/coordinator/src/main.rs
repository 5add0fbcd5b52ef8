use std::sync::Arc;

use coordinator::api;
use coordinator::config::CoordinatorConfig;
use coordinator::events::run_event_logger;
use coordinator::persistence::{load_jobs, save_jobs, spawn_snapshot_task};
use coordinator::{unix_now, AppState};
use registry::{demo, JobRegistry};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = CoordinatorConfig::from_env()?;
    let snapshot_path = config.snapshot_path();

    let jobs = load_jobs(&snapshot_path)?;
    let registry = Arc::new(JobRegistry::from_snapshot(config.registry.clone(), jobs)?);
    if config.seed_demo && registry.is_empty() {
        demo::seed(&registry, unix_now())?;
    }

    tokio::spawn(run_event_logger(registry.subscribe()));
    spawn_snapshot_task(
        registry.clone(),
        snapshot_path.clone(),
        config.snapshot_interval,
    );

    let http_addr = config.http_addr;
    let state = Arc::new(AppState::new(registry.clone(), config));
    let app = api::router(state);

    let listener = tokio::net::TcpListener::bind(http_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "coordinator listening");
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    save_jobs(&snapshot_path, &registry)?;
    tracing::info!(path = ?snapshot_path, count = registry.len(), "final snapshot written");
    Ok(())
}
