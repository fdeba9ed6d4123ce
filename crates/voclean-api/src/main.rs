use anyhow::{Context, Result};
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use voclean_api::{setup, AppState};
use voclean_coordinator::{CleaningCoordinator, JobPoller, JobPollerConfig};
use voclean_core::Config;
use voclean_db::{PgRecordingStore, RecordingStore};
use voclean_processor::{DenoiseHttpClient, DenoiseHttpConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env()?;

    let pool = PgPoolOptions::new()
        .max_connections(10)
        .connect(&config.database_url)
        .await
        .context("Failed to connect to database")?;

    let pg_store = PgRecordingStore::new(pool);
    pg_store
        .run_migrations()
        .await
        .context("Failed to run database migrations")?;
    let store: Arc<dyn RecordingStore> = Arc::new(pg_store);

    let processor = Arc::new(DenoiseHttpClient::new(DenoiseHttpConfig {
        base_url: config.denoise_api_url.clone(),
        api_key: config.denoise_api_key.clone(),
        timeout_secs: config.processor_timeout.as_secs(),
    }));

    let callback_url = config
        .public_base_url
        .as_ref()
        .map(|base| format!("{}/webhooks/denoise", base.trim_end_matches('/')));
    if callback_url.is_none() {
        tracing::info!("PUBLIC_BASE_URL not set, running in polling-only mode");
    }

    let coordinator = Arc::new(CleaningCoordinator::new(
        store.clone(),
        processor,
        callback_url,
    ));

    let poller = Arc::new(JobPoller::new(
        coordinator.clone(),
        JobPollerConfig {
            interval: config.poll_interval,
            failure_warn_threshold: config.poll_failure_warn_threshold,
        },
    ));

    setup::resume_inflight_polling(store.as_ref(), &poller).await?;

    let state = Arc::new(AppState::new(store, coordinator, poller.clone()));
    let router = setup::build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", config.bind_addr))?;
    tracing::info!(addr = %config.bind_addr, "voclean API listening");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            tracing::info!("Shutdown signal received");
        })
        .await
        .context("Server error")?;

    poller.shutdown();

    Ok(())
}
