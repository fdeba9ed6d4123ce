use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use voclean_coordinator::CoordinatorError;
use voclean_core::models::{RecordingResponse, RecordingStatus};

use crate::error::ApiError;
use crate::handlers::CallerId;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRecordingRequest {
    /// URI of the unprocessed source audio.
    pub raw_url: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitCleanResponse {
    pub job_id: String,
    pub status: RecordingStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CleanStatusResponse {
    pub status: RecordingStatus,
    /// True when no work remains to poll for.
    pub terminal: bool,
}

/// Register a new recording in `raw` state.
#[tracing::instrument(skip(state, request))]
pub async fn create_recording(
    CallerId(caller_id): CallerId,
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateRecordingRequest>,
) -> Result<(StatusCode, Json<RecordingResponse>), ApiError> {
    let recording = state
        .store
        .create_recording(caller_id, &request.raw_url)
        .await
        .map_err(CoordinatorError::from)?;

    Ok((StatusCode::CREATED, Json(RecordingResponse::from(recording))))
}

/// Owner-scoped read of a recording. The four user-visible cleaning states
/// are derivable from `status` alone.
#[tracing::instrument(skip(state))]
pub async fn get_recording(
    CallerId(caller_id): CallerId,
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<Uuid>,
) -> Result<Json<RecordingResponse>, ApiError> {
    let recording = state
        .coordinator
        .get_recording(recording_id, caller_id)
        .await?;

    Ok(Json(RecordingResponse::from(recording)))
}

/// Submit a cleaning job and start polling for its completion.
#[tracing::instrument(skip(state))]
pub async fn submit_clean(
    CallerId(caller_id): CallerId,
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<Uuid>,
) -> Result<(StatusCode, Json<SubmitCleanResponse>), ApiError> {
    let job_id = state
        .coordinator
        .submit_cleaning_job(recording_id, caller_id)
        .await?;

    // Drive the job to completion server-side; the webhook (when
    // configured) just gets there first.
    state.poller.watch(recording_id, caller_id);

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitCleanResponse {
            job_id,
            status: RecordingStatus::Cleaning,
        }),
    ))
}

/// One re-entrant status poll. Terminal once the job is done; safe to call
/// as often as the client likes.
#[tracing::instrument(skip(state))]
pub async fn clean_status(
    CallerId(caller_id): CallerId,
    State(state): State<Arc<AppState>>,
    Path(recording_id): Path<Uuid>,
) -> Result<Json<CleanStatusResponse>, ApiError> {
    let outcome = state
        .coordinator
        .poll_job_status(recording_id, caller_id)
        .await?;

    Ok(Json(CleanStatusResponse {
        status: outcome.status,
        terminal: outcome.terminal,
    }))
}
