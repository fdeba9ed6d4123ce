//! HTTP error response conversion for coordinator and store errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use utoipa::ToSchema;

use voclean_coordinator::CoordinatorError;

#[derive(Debug, Serialize, ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    /// Machine-readable error code for programmatic handling.
    pub code: String,
    /// Whether the caller can retry the same request later.
    pub recoverable: bool,
}

/// Wrapper so the external `CoordinatorError` can carry an `IntoResponse`
/// impl (orphan rules forbid implementing it on the error directly).
#[derive(Debug)]
pub struct ApiError(pub CoordinatorError);

impl From<CoordinatorError> for ApiError {
    fn from(err: CoordinatorError) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match &self.0 {
            CoordinatorError::NotFound(_) | CoordinatorError::UnknownJob(_) => {
                StatusCode::NOT_FOUND
            }
            CoordinatorError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            CoordinatorError::AlreadyInProgress(_) => StatusCode::CONFLICT,
            CoordinatorError::RemoteSubmissionFailed(_) | CoordinatorError::PollFailed(_) => {
                StatusCode::BAD_GATEWAY
            }
            CoordinatorError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn code(&self) -> &'static str {
        match &self.0 {
            CoordinatorError::NotFound(_) => "not_found",
            CoordinatorError::PermissionDenied(_) => "permission_denied",
            CoordinatorError::AlreadyInProgress(_) => "already_in_progress",
            CoordinatorError::RemoteSubmissionFailed(_) => "remote_submission_failed",
            CoordinatorError::PollFailed(_) => "poll_failed",
            CoordinatorError::UnknownJob(_) => "unknown_job",
            CoordinatorError::Store(_) => "storage_error",
        }
    }

    fn recoverable(&self) -> bool {
        matches!(
            &self.0,
            CoordinatorError::RemoteSubmissionFailed(_)
                | CoordinatorError::PollFailed(_)
                | CoordinatorError::Store(_)
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        // Conflicts are expected under concurrent submission; only log
        // server-side failures loudly.
        if status.is_server_error() {
            tracing::error!(error = %self.0, code = self.code(), "Request failed");
        } else {
            tracing::debug!(error = %self.0, code = self.code(), "Request rejected");
        }

        let body = Json(ErrorResponse {
            error: self.0.to_string(),
            code: self.code().to_string(),
            recoverable: self.recoverable(),
        });

        (status, body).into_response()
    }
}

/// Request-shape errors raised before the coordinator is involved.
#[derive(Debug)]
pub struct BadRequest(pub String);

impl IntoResponse for BadRequest {
    fn into_response(self) -> Response {
        let body = Json(ErrorResponse {
            error: self.0,
            code: "bad_request".to_string(),
            recoverable: false,
        });
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}
