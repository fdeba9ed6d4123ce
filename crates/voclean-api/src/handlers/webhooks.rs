use axum::{
    extract::State,
    response::{IntoResponse, Json, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;

use voclean_core::models::RecordingStatus;
use voclean_processor::JobState;

use crate::error::{ApiError, BadRequest};
use crate::state::AppState;

/// Completion notification pushed by the denoise service. Performs the same
/// reconciliation as a status poll; polling and webhooks can race freely.
#[derive(Debug, Deserialize, ToSchema)]
pub struct DenoiseWebhookPayload {
    pub job_id: String,
    /// One of `queued`, `in_progress`, `succeeded`, `failed`.
    pub state: String,
    pub output_url: Option<String>,
    pub reason: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DenoiseWebhookAck {
    pub status: RecordingStatus,
}

fn parse_webhook_state(payload: &DenoiseWebhookPayload) -> Result<JobState, BadRequest> {
    match payload.state.as_str() {
        "queued" => Ok(JobState::Queued),
        "in_progress" => Ok(JobState::InProgress),
        "succeeded" => {
            let output_url = payload.output_url.clone().ok_or_else(|| {
                BadRequest("succeeded notification is missing output_url".to_string())
            })?;
            Ok(JobState::Succeeded { output_url })
        }
        "failed" => Ok(JobState::Failed {
            reason: payload
                .reason
                .clone()
                .unwrap_or_else(|| "no reason reported".to_string()),
        }),
        other => Err(BadRequest(format!("unknown job state '{}'", other))),
    }
}

#[tracing::instrument(skip(state, payload), fields(job_id = %payload.job_id))]
pub async fn denoise_webhook(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<DenoiseWebhookPayload>,
) -> Result<Json<DenoiseWebhookAck>, Response> {
    let job_state = parse_webhook_state(&payload).map_err(IntoResponse::into_response)?;

    let status = state
        .coordinator
        .reconcile_by_job_id(&payload.job_id, job_state)
        .await
        .map_err(|e| ApiError(e).into_response())?;

    Ok(Json(DenoiseWebhookAck { status }))
}
