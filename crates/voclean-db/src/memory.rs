//! In-memory recording store, used by tests and local development.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Mutex;
use uuid::Uuid;

use voclean_core::models::{Recording, RecordingStatus};

use crate::store::{RecordingStore, StoreError, TransitionUpdate};

#[derive(Default)]
pub struct MemoryRecordingStore {
    recordings: Mutex<HashMap<Uuid, Recording>>,
}

impl MemoryRecordingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a fully-specified recording, bypassing the `raw` initial state.
    /// Test-oriented convenience.
    pub fn insert(&self, recording: Recording) {
        let mut recordings = self.recordings.lock().expect("recording map lock poisoned");
        recordings.insert(recording.id, recording);
    }
}

#[async_trait]
impl RecordingStore for MemoryRecordingStore {
    async fn create_recording(
        &self,
        owner_id: Uuid,
        raw_url: &str,
    ) -> Result<Recording, StoreError> {
        let now = Utc::now();
        let recording = Recording {
            id: Uuid::new_v4(),
            owner_id,
            raw_url: raw_url.to_string(),
            cleaned_url: None,
            external_job_id: None,
            status: RecordingStatus::Raw,
            created_at: now,
            updated_at: now,
        };

        let mut recordings = self
            .recordings
            .lock()
            .map_err(|_| StoreError::Backend("recording map lock poisoned".to_string()))?;
        recordings.insert(recording.id, recording.clone());

        Ok(recording)
    }

    async fn get_recording(&self, id: Uuid) -> Result<Option<Recording>, StoreError> {
        let recordings = self
            .recordings
            .lock()
            .map_err(|_| StoreError::Backend("recording map lock poisoned".to_string()))?;
        Ok(recordings.get(&id).cloned())
    }

    async fn get_recording_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Option<Recording>, StoreError> {
        let recordings = self
            .recordings
            .lock()
            .map_err(|_| StoreError::Backend("recording map lock poisoned".to_string()))?;
        Ok(recordings
            .values()
            .find(|r| r.external_job_id.as_deref() == Some(job_id))
            .cloned())
    }

    async fn list_recordings_by_status(
        &self,
        status: RecordingStatus,
    ) -> Result<Vec<Recording>, StoreError> {
        let recordings = self
            .recordings
            .lock()
            .map_err(|_| StoreError::Backend("recording map lock poisoned".to_string()))?;
        Ok(recordings
            .values()
            .filter(|r| r.status == status)
            .cloned()
            .collect())
    }

    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: RecordingStatus,
        new: RecordingStatus,
        update: TransitionUpdate,
    ) -> Result<bool, StoreError> {
        let mut recordings = self
            .recordings
            .lock()
            .map_err(|_| StoreError::Backend("recording map lock poisoned".to_string()))?;

        // Check and write under one lock hold, mirroring the single
        // conditional UPDATE of the Postgres store.
        let Some(recording) = recordings.get_mut(&id) else {
            return Ok(false);
        };
        if recording.status != expected {
            return Ok(false);
        }

        recording.status = new;
        if let Some(job_id) = update.external_job_id {
            recording.external_job_id = job_id;
        }
        if let Some(cleaned_url) = update.cleaned_url {
            recording.cleaned_url = cleaned_url;
        }
        recording.updated_at = Utc::now();

        Ok(true)
    }
}
