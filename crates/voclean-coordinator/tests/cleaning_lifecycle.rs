//! End-to-end lifecycle tests for the cleaning coordinator and poller,
//! driven by the in-memory store and a scripted processor.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use uuid::Uuid;

use voclean_coordinator::{
    CleaningCoordinator, CoordinatorError, JobPoller, JobPollerConfig,
};
use voclean_core::models::{Recording, RecordingStatus};
use voclean_db::{MemoryRecordingStore, RecordingStore};
use voclean_processor::{JobProcessor, JobState, ProcessorError};

/// Processor double that replays scripted responses in order. The last
/// status response is repeated once the script runs out.
#[derive(Default)]
struct ScriptedProcessor {
    create_responses: Mutex<VecDeque<Result<String, ProcessorError>>>,
    status_responses: Mutex<VecDeque<Result<JobState, ProcessorError>>>,
    last_status: Mutex<Option<JobState>>,
    create_calls: AtomicUsize,
    status_calls: AtomicUsize,
}

impl ScriptedProcessor {
    fn new() -> Self {
        Self::default()
    }

    fn push_create(&self, response: Result<String, ProcessorError>) {
        self.create_responses.lock().unwrap().push_back(response);
    }

    fn push_status(&self, response: Result<JobState, ProcessorError>) {
        self.status_responses.lock().unwrap().push_back(response);
    }

    fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl JobProcessor for ScriptedProcessor {
    async fn create_job(
        &self,
        _source_url: &str,
        _callback_url: Option<&str>,
    ) -> Result<String, ProcessorError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.create_responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(ProcessorError::Transport("script exhausted".to_string())))
    }

    async fn job_status(&self, _job_id: &str) -> Result<JobState, ProcessorError> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let scripted = self.status_responses.lock().unwrap().pop_front();
        match scripted {
            Some(response) => {
                if let Ok(state) = &response {
                    *self.last_status.lock().unwrap() = Some(state.clone());
                }
                response
            }
            None => match self.last_status.lock().unwrap().clone() {
                Some(state) => Ok(state),
                None => Err(ProcessorError::Transport("script exhausted".to_string())),
            },
        }
    }
}

struct Harness {
    store: Arc<MemoryRecordingStore>,
    processor: Arc<ScriptedProcessor>,
    coordinator: Arc<CleaningCoordinator>,
    owner_id: Uuid,
}

fn harness() -> Harness {
    let store = Arc::new(MemoryRecordingStore::new());
    let processor = Arc::new(ScriptedProcessor::new());
    let coordinator = Arc::new(CleaningCoordinator::new(
        store.clone(),
        processor.clone(),
        None,
    ));
    Harness {
        store,
        processor,
        coordinator,
        owner_id: Uuid::new_v4(),
    }
}

impl Harness {
    async fn raw_recording(&self) -> Recording {
        self.store
            .create_recording(self.owner_id, "https://cdn.example.com/raw.wav")
            .await
            .unwrap()
    }

    fn cleaning_recording(&self, job_id: &str) -> Recording {
        let now = Utc::now();
        let recording = Recording {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            raw_url: "https://cdn.example.com/raw.wav".to_string(),
            cleaned_url: None,
            external_job_id: Some(job_id.to_string()),
            status: RecordingStatus::Cleaning,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(recording.clone());
        recording
    }

    async fn fetch(&self, id: Uuid) -> Recording {
        self.store.get_recording(id).await.unwrap().unwrap()
    }
}

#[tokio::test]
async fn happy_path_submit_then_poll_to_cleaned() {
    let h = harness();
    let r1 = h.raw_recording().await;
    h.processor.push_create(Ok("job-123".to_string()));
    h.processor.push_status(Ok(JobState::InProgress));
    h.processor.push_status(Ok(JobState::Succeeded {
        output_url: "https://cdn/clean.wav".to_string(),
    }));

    let job_id = h
        .coordinator
        .submit_cleaning_job(r1.id, h.owner_id)
        .await
        .unwrap();
    assert_eq!(job_id, "job-123");

    let row = h.fetch(r1.id).await;
    assert_eq!(row.status, RecordingStatus::Cleaning);
    assert_eq!(row.external_job_id.as_deref(), Some("job-123"));

    let outcome = h
        .coordinator
        .poll_job_status(r1.id, h.owner_id)
        .await
        .unwrap();
    assert!(!outcome.terminal);
    assert_eq!(outcome.status, RecordingStatus::Cleaning);

    let outcome = h
        .coordinator
        .poll_job_status(r1.id, h.owner_id)
        .await
        .unwrap();
    assert!(outcome.terminal);
    assert_eq!(outcome.status, RecordingStatus::Cleaned);

    let row = h.fetch(r1.id).await;
    assert_eq!(row.status, RecordingStatus::Cleaned);
    assert_eq!(row.cleaned_url.as_deref(), Some("https://cdn/clean.wav"));
    assert_eq!(row.raw_url, "https://cdn.example.com/raw.wav");
}

#[tokio::test]
async fn remote_job_failure_moves_recording_to_error() {
    let h = harness();
    let r2 = h.raw_recording().await;
    h.processor.push_create(Ok("job-777".to_string()));
    h.processor.push_status(Ok(JobState::Failed {
        reason: "unsupported format".to_string(),
    }));

    h.coordinator
        .submit_cleaning_job(r2.id, h.owner_id)
        .await
        .unwrap();

    let outcome = h
        .coordinator
        .poll_job_status(r2.id, h.owner_id)
        .await
        .unwrap();
    assert!(outcome.terminal);
    assert_eq!(outcome.status, RecordingStatus::Error);
    assert_eq!(h.fetch(r2.id).await.status, RecordingStatus::Error);
}

#[tokio::test]
async fn duplicate_submission_is_rejected_and_keeps_handle() {
    let h = harness();
    let r3 = h.cleaning_recording("job-456");

    let result = h.coordinator.submit_cleaning_job(r3.id, h.owner_id).await;
    assert!(matches!(
        result,
        Err(CoordinatorError::AlreadyInProgress(id)) if id == r3.id
    ));

    let row = h.fetch(r3.id).await;
    assert_eq!(row.external_job_id.as_deref(), Some("job-456"));
    assert_eq!(row.status, RecordingStatus::Cleaning);
    assert_eq!(h.processor.create_calls(), 0);
}

#[tokio::test]
async fn concurrent_submissions_create_exactly_one_job() {
    let h = harness();
    let recording = h.raw_recording().await;
    h.processor.push_create(Ok("job-a".to_string()));
    h.processor.push_create(Ok("job-b".to_string()));

    let (first, second) = tokio::join!(
        h.coordinator.submit_cleaning_job(recording.id, h.owner_id),
        h.coordinator.submit_cleaning_job(recording.id, h.owner_id),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one submission must win");
    assert_eq!(h.processor.create_calls(), 1);

    let loser = if first.is_err() { first } else { second };
    assert!(matches!(
        loser,
        Err(CoordinatorError::AlreadyInProgress(_))
    ));
}

#[tokio::test]
async fn ownership_is_enforced_on_both_operations() {
    let h = harness();
    let recording = h.raw_recording().await;
    let stranger = Uuid::new_v4();

    let submit = h.coordinator.submit_cleaning_job(recording.id, stranger).await;
    assert!(matches!(submit, Err(CoordinatorError::PermissionDenied(_))));

    let poll = h.coordinator.poll_job_status(recording.id, stranger).await;
    assert!(matches!(poll, Err(CoordinatorError::PermissionDenied(_))));

    // Status untouched regardless of the recording's state.
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Raw);
    assert_eq!(h.processor.create_calls(), 0);
    assert_eq!(h.processor.status_calls(), 0);
}

#[tokio::test]
async fn unknown_recording_is_not_found() {
    let h = harness();
    let missing = Uuid::new_v4();

    let submit = h.coordinator.submit_cleaning_job(missing, h.owner_id).await;
    assert!(matches!(submit, Err(CoordinatorError::NotFound(id)) if id == missing));

    let poll = h.coordinator.poll_job_status(missing, h.owner_id).await;
    assert!(matches!(poll, Err(CoordinatorError::NotFound(_))));
}

#[tokio::test]
async fn failed_remote_submission_rolls_back_to_error() {
    let h = harness();
    let recording = h.raw_recording().await;
    h.processor
        .push_create(Err(ProcessorError::Remote("invalid source".to_string())));

    let result = h
        .coordinator
        .submit_cleaning_job(recording.id, h.owner_id)
        .await;
    match result {
        Err(CoordinatorError::RemoteSubmissionFailed(msg)) => {
            assert!(msg.contains("invalid source"));
        }
        other => panic!("expected RemoteSubmissionFailed, got {:?}", other),
    }

    // Recorded as a failed attempt, not rolled back to raw.
    let row = h.fetch(recording.id).await;
    assert_eq!(row.status, RecordingStatus::Error);

    // A retry from error is allowed and goes through.
    h.processor.push_create(Ok("job-retry".to_string()));
    let job_id = h
        .coordinator
        .submit_cleaning_job(recording.id, h.owner_id)
        .await
        .unwrap();
    assert_eq!(job_id, "job-retry");
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Cleaning);
}

#[tokio::test]
async fn polling_after_terminal_state_short_circuits() {
    let h = harness();
    let recording = h.raw_recording().await;
    h.processor.push_create(Ok("job-123".to_string()));
    h.processor.push_status(Ok(JobState::Succeeded {
        output_url: "https://cdn/clean.wav".to_string(),
    }));

    h.coordinator
        .submit_cleaning_job(recording.id, h.owner_id)
        .await
        .unwrap();
    h.coordinator
        .poll_job_status(recording.id, h.owner_id)
        .await
        .unwrap();

    let calls_after_terminal = h.processor.status_calls();
    for _ in 0..3 {
        let outcome = h
            .coordinator
            .poll_job_status(recording.id, h.owner_id)
            .await
            .unwrap();
        assert!(outcome.terminal);
        assert_eq!(outcome.status, RecordingStatus::Cleaned);
    }

    // Short-circuit: no further processor traffic once terminal.
    assert_eq!(h.processor.status_calls(), calls_after_terminal);

    // Output location is stable across the repeated polls.
    let row = h.fetch(recording.id).await;
    assert_eq!(row.cleaned_url.as_deref(), Some("https://cdn/clean.wav"));
}

#[tokio::test]
async fn transient_poll_failure_leaves_state_untouched() {
    let h = harness();
    let recording = h.cleaning_recording("job-9");
    h.processor
        .push_status(Err(ProcessorError::Transport("timeout".to_string())));

    let result = h.coordinator.poll_job_status(recording.id, h.owner_id).await;
    assert!(matches!(result, Err(CoordinatorError::PollFailed(_))));

    // Re-fetch: the row is still cleaning and the handle survived.
    let row = h.fetch(recording.id).await;
    assert_eq!(row.status, RecordingStatus::Cleaning);
    assert_eq!(row.external_job_id.as_deref(), Some("job-9"));

    // The next successful poll completes the job.
    h.processor.push_status(Ok(JobState::Succeeded {
        output_url: "https://cdn/clean.wav".to_string(),
    }));
    let outcome = h
        .coordinator
        .poll_job_status(recording.id, h.owner_id)
        .await
        .unwrap();
    assert!(outcome.terminal);
    assert_eq!(outcome.status, RecordingStatus::Cleaned);
}

#[tokio::test]
async fn webhook_reconciles_by_job_handle() {
    let h = harness();
    let recording = h.cleaning_recording("job-hook");

    let status = h
        .coordinator
        .reconcile_by_job_id(
            "job-hook",
            JobState::Succeeded {
                output_url: "https://cdn/clean.wav".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(status, RecordingStatus::Cleaned);

    let row = h.fetch(recording.id).await;
    assert_eq!(row.status, RecordingStatus::Cleaned);
    assert_eq!(row.cleaned_url.as_deref(), Some("https://cdn/clean.wav"));

    // A late duplicate report is a no-op, not a conflicting write.
    let status = h
        .coordinator
        .reconcile_by_job_id(
            "job-hook",
            JobState::Failed {
                reason: "stale".to_string(),
            },
        )
        .await
        .unwrap();
    assert_eq!(status, RecordingStatus::Cleaned);
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Cleaned);
}

#[tokio::test]
async fn webhook_with_unknown_handle_is_rejected() {
    let h = harness();
    let result = h
        .coordinator
        .reconcile_by_job_id("job-nobody", JobState::InProgress)
        .await;
    assert!(matches!(result, Err(CoordinatorError::UnknownJob(_))));
}

fn fast_poller(h: &Harness) -> JobPoller {
    JobPoller::new(
        h.coordinator.clone(),
        JobPollerConfig {
            interval: Duration::from_millis(10),
            failure_warn_threshold: 3,
        },
    )
}

#[tokio::test]
async fn poller_stops_itself_on_terminal_state() {
    let h = harness();
    let recording = h.cleaning_recording("job-p1");
    h.processor.push_status(Ok(JobState::InProgress));
    h.processor.push_status(Ok(JobState::Succeeded {
        output_url: "https://cdn/clean.wav".to_string(),
    }));

    let poller = fast_poller(&h);
    assert!(poller.watch(recording.id, h.owner_id));

    tokio::time::sleep(Duration::from_millis(200)).await;

    assert!(!poller.is_watching(recording.id));
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Cleaned);
}

#[tokio::test]
async fn poller_deduplicates_loops_per_recording() {
    let h = harness();
    let recording = h.cleaning_recording("job-p2");
    h.processor.push_status(Ok(JobState::InProgress));

    let poller = fast_poller(&h);
    assert!(poller.watch(recording.id, h.owner_id));
    assert!(!poller.watch(recording.id, h.owner_id));
    assert!(poller.is_watching(recording.id));

    poller.stop(recording.id);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(!poller.is_watching(recording.id));

    // Cancellation does not touch the server-side state.
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Cleaning);
}

#[tokio::test]
async fn poller_survives_transient_failures() {
    let h = harness();
    let recording = h.cleaning_recording("job-p3");
    h.processor
        .push_status(Err(ProcessorError::Transport("timeout".to_string())));
    h.processor
        .push_status(Err(ProcessorError::Transport("timeout".to_string())));
    h.processor.push_status(Ok(JobState::Succeeded {
        output_url: "https://cdn/clean.wav".to_string(),
    }));

    let poller = fast_poller(&h);
    assert!(poller.watch(recording.id, h.owner_id));

    tokio::time::sleep(Duration::from_millis(300)).await;

    assert!(!poller.is_watching(recording.id));
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Cleaned);
}

#[tokio::test]
async fn poller_stops_on_permanent_error() {
    let h = harness();
    let recording = h.cleaning_recording("job-p4");
    let stranger = Uuid::new_v4();

    let poller = fast_poller(&h);
    assert!(poller.watch(recording.id, stranger));

    tokio::time::sleep(Duration::from_millis(100)).await;

    // PermissionDenied is permanent; the loop gives up.
    assert!(!poller.is_watching(recording.id));
    assert_eq!(h.fetch(recording.id).await.status, RecordingStatus::Cleaning);
}
