use async_trait::async_trait;
use thiserror::Error;

/// State of a job as reported by the external processor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobState {
    Queued,
    InProgress,
    Succeeded { output_url: String },
    Failed { reason: String },
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobState::Succeeded { .. } | JobState::Failed { .. })
    }
}

#[derive(Debug, Error)]
pub enum ProcessorError {
    /// The processor received the request and rejected it. The job (or the
    /// submission) is bad; retrying the same call will not help.
    #[error("processor rejected request: {0}")]
    Remote(String),
    /// The processor could not be reached or answered unintelligibly.
    /// Transient; the caller retries on its own schedule.
    #[error("processor transport failure: {0}")]
    Transport(String),
}

/// Narrow interface to the external noise-reduction service.
///
/// Any processor that can accept a source location, hand back an opaque job
/// handle, and later report one of queued/in-progress/succeeded/failed with
/// an output location satisfies this.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Submit a new job for `source_url`. `callback_url`, when given, is
    /// where the processor should push a completion notification; without
    /// it the job is polling-only.
    async fn create_job(
        &self,
        source_url: &str,
        callback_url: Option<&str>,
    ) -> Result<String, ProcessorError>;

    /// Query the current state of a previously created job.
    async fn job_status(&self, job_id: &str) -> Result<JobState, ProcessorError>;
}
