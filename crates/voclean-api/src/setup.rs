//! Application wiring: router construction and startup helpers.

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use voclean_coordinator::JobPoller;
use voclean_core::models::RecordingStatus;
use voclean_db::RecordingStore;

use crate::handlers::{recordings, webhooks};
use crate::state::AppState;

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/recordings", post(recordings::create_recording))
        .route("/recordings/{id}", get(recordings::get_recording))
        .route("/recordings/{id}/clean", post(recordings::submit_clean))
        .route(
            "/recordings/{id}/clean/status",
            get(recordings::clean_status),
        )
        .route("/webhooks/denoise", post(webhooks::denoise_webhook))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Restart recovery: any recording left `cleaning` by a previous process
/// gets its polling loop back, so in-flight jobs are never orphaned.
pub async fn resume_inflight_polling(
    store: &dyn RecordingStore,
    poller: &JobPoller,
) -> anyhow::Result<()> {
    let inflight = store
        .list_recordings_by_status(RecordingStatus::Cleaning)
        .await?;

    let count = inflight.len();
    for recording in inflight {
        poller.watch(recording.id, recording.owner_id);
    }

    if count > 0 {
        tracing::info!(count = count, "Resumed polling for in-flight cleaning jobs");
    }

    Ok(())
}
