use std::sync::Arc;

use voclean_coordinator::{CleaningCoordinator, JobPoller};
use voclean_db::RecordingStore;

/// Shared application state handed to every handler.
pub struct AppState {
    pub store: Arc<dyn RecordingStore>,
    pub coordinator: Arc<CleaningCoordinator>,
    pub poller: Arc<JobPoller>,
}

impl AppState {
    pub fn new(
        store: Arc<dyn RecordingStore>,
        coordinator: Arc<CleaningCoordinator>,
        poller: Arc<JobPoller>,
    ) -> Self {
        Self {
            store,
            coordinator,
            poller,
        }
    }
}
