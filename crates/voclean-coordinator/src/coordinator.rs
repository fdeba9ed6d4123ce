use std::sync::Arc;
use uuid::Uuid;

use voclean_core::models::{Recording, RecordingStatus};
use voclean_db::{RecordingStore, TransitionUpdate};
use voclean_processor::{JobProcessor, JobState};

use crate::error::CoordinatorError;

/// Result of a status poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOutcome {
    pub status: RecordingStatus,
    /// True when no work remains to poll for.
    pub terminal: bool,
}

/// Coordinates the cleaning lifecycle of recordings.
///
/// Stateless per call: all durable state lives in the store, and every
/// transition is a conditional write guarded by the current status, so the
/// coordinator is safe to invoke concurrently from any number of clients.
pub struct CleaningCoordinator {
    store: Arc<dyn RecordingStore>,
    processor: Arc<dyn JobProcessor>,
    /// Webhook address handed to the processor at job creation, when this
    /// deployment is reachable for push notifications.
    callback_url: Option<String>,
}

impl CleaningCoordinator {
    pub fn new(
        store: Arc<dyn RecordingStore>,
        processor: Arc<dyn JobProcessor>,
        callback_url: Option<String>,
    ) -> Self {
        Self {
            store,
            processor,
            callback_url,
        }
    }

    /// Fetch a recording and enforce that `caller_id` owns it.
    async fn fetch_owned(
        &self,
        recording_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Recording, CoordinatorError> {
        let recording = self
            .store
            .get_recording(recording_id)
            .await?
            .ok_or(CoordinatorError::NotFound(recording_id))?;

        if recording.owner_id != caller_id {
            tracing::warn!(
                recording_id = %recording_id,
                caller_id = %caller_id,
                "Rejected cleaning operation from non-owner"
            );
            return Err(CoordinatorError::PermissionDenied(recording_id));
        }

        Ok(recording)
    }

    /// Owner-scoped read of a recording.
    pub async fn get_recording(
        &self,
        recording_id: Uuid,
        caller_id: Uuid,
    ) -> Result<Recording, CoordinatorError> {
        self.fetch_owned(recording_id, caller_id).await
    }

    /// Submit a cleaning job for a recording the caller owns.
    ///
    /// The transition into `cleaning` is a single compare-and-set on the
    /// fetched status; when two submissions race, exactly one claim lands
    /// and the other observes a miss and reports `AlreadyInProgress`.
    #[tracing::instrument(skip(self))]
    pub async fn submit_cleaning_job(
        &self,
        recording_id: Uuid,
        caller_id: Uuid,
    ) -> Result<String, CoordinatorError> {
        let recording = self.fetch_owned(recording_id, caller_id).await?;

        if recording.status == RecordingStatus::Cleaning {
            return Err(CoordinatorError::AlreadyInProgress(recording_id));
        }

        // Re-submission from cleaned or error is allowed; stale artifacts
        // from the previous run are dropped in the same write.
        let claimed = self
            .store
            .compare_and_set_status(
                recording_id,
                recording.status,
                RecordingStatus::Cleaning,
                TransitionUpdate::clear_job_artifacts(),
            )
            .await?;

        if !claimed {
            // Lost the race: another submission moved the row first.
            return Err(CoordinatorError::AlreadyInProgress(recording_id));
        }

        match self
            .processor
            .create_job(&recording.raw_url, self.callback_url.as_deref())
            .await
        {
            Ok(job_id) => {
                let recorded = self
                    .store
                    .compare_and_set_status(
                        recording_id,
                        RecordingStatus::Cleaning,
                        RecordingStatus::Cleaning,
                        TransitionUpdate::set_job_id(&job_id),
                    )
                    .await?;

                if !recorded {
                    // Nothing else knows this handle yet, so a miss means
                    // the row was moved out from under us externally.
                    tracing::warn!(
                        recording_id = %recording_id,
                        job_id = %job_id,
                        "Recording left cleaning state before job handle was persisted"
                    );
                }

                tracing::info!(
                    recording_id = %recording_id,
                    job_id = %job_id,
                    "Cleaning job submitted"
                );

                Ok(job_id)
            }
            Err(e) => {
                // The attempt is recorded as failed, distinct from
                // never-attempted, so it survives client disconnection.
                self.store
                    .compare_and_set_status(
                        recording_id,
                        RecordingStatus::Cleaning,
                        RecordingStatus::Error,
                        TransitionUpdate::none(),
                    )
                    .await?;

                tracing::error!(
                    recording_id = %recording_id,
                    error = %e,
                    "Remote job creation failed, recording moved to error"
                );

                Err(CoordinatorError::RemoteSubmissionFailed(e.to_string()))
            }
        }
    }

    /// Poll the external processor for a recording the caller owns.
    ///
    /// Safe to call repeatedly: once the recording is out of `cleaning`
    /// this short-circuits without touching the processor or the row.
    #[tracing::instrument(skip(self))]
    pub async fn poll_job_status(
        &self,
        recording_id: Uuid,
        caller_id: Uuid,
    ) -> Result<PollOutcome, CoordinatorError> {
        let recording = self.fetch_owned(recording_id, caller_id).await?;

        if recording.status != RecordingStatus::Cleaning {
            return Ok(PollOutcome {
                status: recording.status,
                terminal: true,
            });
        }

        let Some(job_id) = recording.external_job_id.as_deref() else {
            // Claimed but the handle is not persisted yet; the submission
            // call is still in flight. Nothing to query, try again later.
            return Ok(PollOutcome {
                status: RecordingStatus::Cleaning,
                terminal: false,
            });
        };

        // A transport failure here must not be conflated with a job
        // failure: the row stays `cleaning` and the next poll retries.
        let state = self
            .processor
            .job_status(job_id)
            .await
            .map_err(|e| CoordinatorError::PollFailed(e.to_string()))?;

        let status = self.reconcile(recording_id, state).await?;

        Ok(PollOutcome {
            status,
            terminal: status.is_terminal(),
        })
    }

    /// Reconcile a processor-reported job state onto the recording.
    ///
    /// Shared by polling and the webhook. Writes are conditional on the row
    /// still being `cleaning`, so a second terminal report for the same job
    /// is a harmless no-op and the stored outcome is whoever landed first.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile(
        &self,
        recording_id: Uuid,
        state: JobState,
    ) -> Result<RecordingStatus, CoordinatorError> {
        match state {
            JobState::Queued | JobState::InProgress => Ok(RecordingStatus::Cleaning),
            JobState::Succeeded { output_url } => {
                let applied = self
                    .store
                    .compare_and_set_status(
                        recording_id,
                        RecordingStatus::Cleaning,
                        RecordingStatus::Cleaned,
                        TransitionUpdate::set_cleaned_url(&output_url),
                    )
                    .await?;

                if applied {
                    tracing::info!(
                        recording_id = %recording_id,
                        cleaned_url = %output_url,
                        "Recording cleaned"
                    );
                    Ok(RecordingStatus::Cleaned)
                } else {
                    self.current_status(recording_id).await
                }
            }
            JobState::Failed { reason } => {
                let applied = self
                    .store
                    .compare_and_set_status(
                        recording_id,
                        RecordingStatus::Cleaning,
                        RecordingStatus::Error,
                        TransitionUpdate::none(),
                    )
                    .await?;

                if applied {
                    tracing::warn!(
                        recording_id = %recording_id,
                        reason = %reason,
                        "Cleaning job failed"
                    );
                    Ok(RecordingStatus::Error)
                } else {
                    self.current_status(recording_id).await
                }
            }
        }
    }

    /// Webhook entry point: resolve the recording by job handle and run the
    /// same reconciliation as polling.
    #[tracing::instrument(skip(self))]
    pub async fn reconcile_by_job_id(
        &self,
        job_id: &str,
        state: JobState,
    ) -> Result<RecordingStatus, CoordinatorError> {
        let recording = self
            .store
            .get_recording_by_job_id(job_id)
            .await?
            .ok_or_else(|| CoordinatorError::UnknownJob(job_id.to_string()))?;

        self.reconcile(recording.id, state).await
    }

    /// Re-read after a reconcile CAS miss: another channel (webhook or a
    /// concurrent poll) already landed the terminal transition.
    async fn current_status(
        &self,
        recording_id: Uuid,
    ) -> Result<RecordingStatus, CoordinatorError> {
        let recording = self
            .store
            .get_recording(recording_id)
            .await?
            .ok_or(CoordinatorError::NotFound(recording_id))?;
        Ok(recording.status)
    }
}
