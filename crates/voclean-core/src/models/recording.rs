use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

/// Lifecycle state of a recording's noise-reduction job.
///
/// `Cleaning` is the only state with an external job attached. `Cleaned` and
/// `Error` are terminal until a new submission re-enters `Cleaning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(
    feature = "sqlx",
    sqlx(type_name = "recording_status", rename_all = "lowercase")
)]
pub enum RecordingStatus {
    Raw,
    Cleaning,
    Cleaned,
    Error,
}

impl RecordingStatus {
    /// True when no further automatic transition will occur without a new
    /// explicit submission.
    pub fn is_terminal(self) -> bool {
        !matches!(self, RecordingStatus::Cleaning)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            RecordingStatus::Raw => "raw",
            RecordingStatus::Cleaning => "cleaning",
            RecordingStatus::Cleaned => "cleaned",
            RecordingStatus::Error => "error",
        }
    }
}

impl fmt::Display for RecordingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recording entity: the owned resource undergoing optional audio cleanup.
///
/// `owner_id` and `raw_url` are immutable after creation; the coordinator
/// mutates only `status`, `external_job_id`, and `cleaned_url`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Recording {
    pub id: Uuid,
    pub owner_id: Uuid,
    /// URI of the unprocessed source audio.
    pub raw_url: String,
    /// URI of the processed output; present only when status is `cleaned`.
    pub cleaned_url: Option<String>,
    /// Opaque correlation id assigned by the external processor.
    pub external_job_id: Option<String>,
    pub status: RecordingStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// API representation of a recording. The external job id is owner-only
/// correlation data and is omitted from responses.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RecordingResponse {
    pub id: Uuid,
    pub status: RecordingStatus,
    pub raw_url: String,
    pub cleaned_url: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<Recording> for RecordingResponse {
    fn from(recording: Recording) -> Self {
        Self {
            id: recording.id,
            status: recording.status,
            raw_url: recording.raw_url,
            cleaned_url: recording.cleaned_url,
            updated_at: recording.updated_at,
        }
    }
}
