use async_trait::async_trait;
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

use voclean_core::models::{Recording, RecordingStatus};

use crate::store::{RecordingStore, StoreError, TransitionUpdate};

const RECORDING_COLUMNS: &str = r#"
    id,
    owner_id,
    raw_url,
    cleaned_url,
    external_job_id,
    status,
    created_at,
    updated_at
"#;

#[derive(Clone)]
pub struct PgRecordingStore {
    pool: PgPool,
}

impl PgRecordingStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Backend(format!("migration failed: {}", e)))
    }
}

#[async_trait]
impl RecordingStore for PgRecordingStore {
    #[tracing::instrument(skip(self))]
    async fn create_recording(
        &self,
        owner_id: Uuid,
        raw_url: &str,
    ) -> Result<Recording, StoreError> {
        let sql = format!(
            r#"
            INSERT INTO recordings (owner_id, raw_url, status)
            VALUES ($1, $2, 'raw')
            RETURNING {RECORDING_COLUMNS}
            "#
        );
        let recording: Recording = sqlx::query_as::<Postgres, Recording>(&sql)
            .bind(owner_id)
            .bind(raw_url)
            .fetch_one(&self.pool)
            .await?;

        tracing::info!(
            recording_id = %recording.id,
            owner_id = %owner_id,
            "Recording registered"
        );

        Ok(recording)
    }

    #[tracing::instrument(skip(self))]
    async fn get_recording(&self, id: Uuid) -> Result<Option<Recording>, StoreError> {
        let sql = format!(
            r#"
            SELECT {RECORDING_COLUMNS}
            FROM recordings
            WHERE id = $1
            "#
        );
        let recording = sqlx::query_as::<Postgres, Recording>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(recording)
    }

    #[tracing::instrument(skip(self))]
    async fn get_recording_by_job_id(
        &self,
        job_id: &str,
    ) -> Result<Option<Recording>, StoreError> {
        let sql = format!(
            r#"
            SELECT {RECORDING_COLUMNS}
            FROM recordings
            WHERE external_job_id = $1
            "#
        );
        let recording = sqlx::query_as::<Postgres, Recording>(&sql)
            .bind(job_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(recording)
    }

    #[tracing::instrument(skip(self))]
    async fn list_recordings_by_status(
        &self,
        status: RecordingStatus,
    ) -> Result<Vec<Recording>, StoreError> {
        let sql = format!(
            r#"
            SELECT {RECORDING_COLUMNS}
            FROM recordings
            WHERE status = $1
            ORDER BY updated_at ASC
            "#
        );
        let recordings = sqlx::query_as::<Postgres, Recording>(&sql)
            .bind(status)
            .fetch_all(&self.pool)
            .await?;

        Ok(recordings)
    }

    /// Single conditional UPDATE guarded by the current status. The guard in
    /// the WHERE clause is what makes near-simultaneous transitions safe:
    /// only one writer observes the expected status and gets a row back.
    #[tracing::instrument(skip(self, update))]
    async fn compare_and_set_status(
        &self,
        id: Uuid,
        expected: RecordingStatus,
        new: RecordingStatus,
        update: TransitionUpdate,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE recordings
            SET status = $3,
                external_job_id = CASE WHEN $4 THEN $5 ELSE external_job_id END,
                cleaned_url = CASE WHEN $6 THEN $7 ELSE cleaned_url END,
                updated_at = NOW()
            WHERE id = $1 AND status = $2
            "#,
        )
        .bind(id)
        .bind(expected)
        .bind(new)
        .bind(update.external_job_id.is_some())
        .bind(update.external_job_id.flatten())
        .bind(update.cleaned_url.is_some())
        .bind(update.cleaned_url.flatten())
        .execute(&self.pool)
        .await?;

        let applied = result.rows_affected() == 1;

        if applied {
            tracing::debug!(
                recording_id = %id,
                from = %expected,
                to = %new,
                "Recording status transition applied"
            );
        } else {
            tracing::debug!(
                recording_id = %id,
                expected = %expected,
                "Recording status transition skipped, row not in expected state"
            );
        }

        Ok(applied)
    }
}
