use thiserror::Error;
use uuid::Uuid;

use voclean_db::StoreError;

#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// No recording matches the given id. Permanent; not retried.
    #[error("recording {0} not found")]
    NotFound(Uuid),

    /// Caller is not the recording's owner. Permanent; not retried.
    #[error("caller is not the owner of recording {0}")]
    PermissionDenied(Uuid),

    /// A cleaning job is already in flight for this recording. The existing
    /// job is left untouched; callers should treat this as already handled.
    #[error("recording {0} already has a cleaning job in flight")]
    AlreadyInProgress(Uuid),

    /// The external processor rejected or was unreachable during job
    /// creation. The recording has been moved to `error`; a caller may
    /// retry by submitting again.
    #[error("remote job submission failed: {0}")]
    RemoteSubmissionFailed(String),

    /// Transient failure querying the processor during polling. The
    /// recording was not mutated; the next poll retries.
    #[error("status poll failed: {0}")]
    PollFailed(String),

    /// A webhook named a job handle no recording carries.
    #[error("no recording matches job handle '{0}'")]
    UnknownJob(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl CoordinatorError {
    /// True for failures the caller may simply retry later without
    /// changing anything.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            CoordinatorError::PollFailed(_) | CoordinatorError::Store(_)
        )
    }
}
