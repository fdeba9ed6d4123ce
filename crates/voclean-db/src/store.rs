use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use voclean_core::models::{Recording, RecordingStatus};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Field writes applied together with a status transition.
///
/// The outer `Option` selects whether the column is touched at all; the inner
/// value (including `None`) is what gets written. Columns not named here are
/// never mutated by a transition.
#[derive(Debug, Clone, Default)]
pub struct TransitionUpdate {
    pub external_job_id: Option<Option<String>>,
    pub cleaned_url: Option<Option<String>>,
}

impl TransitionUpdate {
    /// Transition with no field writes.
    pub fn none() -> Self {
        Self::default()
    }

    /// Entering `cleaning`: drop any previous job handle and output so the
    /// row carries no stale artifacts from an earlier run.
    pub fn clear_job_artifacts() -> Self {
        Self {
            external_job_id: Some(None),
            cleaned_url: Some(None),
        }
    }

    /// Record the handle returned by the external processor.
    pub fn set_job_id(job_id: impl Into<String>) -> Self {
        Self {
            external_job_id: Some(Some(job_id.into())),
            ..Self::default()
        }
    }

    /// Record the processed output location on success.
    pub fn set_cleaned_url(url: impl Into<String>) -> Self {
        Self {
            cleaned_url: Some(Some(url.into())),
            ..Self::default()
        }
    }
}

/// Narrow storage interface for recordings.
///
/// `compare_and_set_status` is the only way to mutate a row: the write is
/// conditional on the current `status`, which makes `status` the optimistic
/// concurrency discriminant for the whole lifecycle.
#[async_trait]
pub trait RecordingStore: Send + Sync {
    /// Register a new recording in `raw` state.
    async fn create_recording(
        &self,
        owner_id: Uuid,
        raw_url: &str,
    ) -> Result<Recording, StoreError>;

    async fn get_recording(&self, id: Uuid) -> Result<Option<Recording>, StoreError>;

    /// Resolve a recording by the external processor's job handle. Used by
    /// the webhook entry point, which only knows the handle.
    async fn get_recording_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Option<Recording>, StoreError>;

    /// List recordings currently in the given state. Used at startup to
    /// resume polling for jobs that were in flight when the service
    /// restarted.
    async fn list_recordings_by_status(
        &self,
        status: RecordingStatus,
    ) -> Result<Vec<Recording>, StoreError>;

    /// Atomically move `status` from `expected` to `new`, applying `update`
    /// in the same statement. Returns `false` when the row was not in
    /// `expected` state (or does not exist) and nothing was written.
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: RecordingStatus,
        new: RecordingStatus,
        update: TransitionUpdate,
    ) -> Result<bool, StoreError>;
}
