//! Import job repository implementation.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use skillmap_core::{
    new_v7, Error, ImportJob, ImportJobRepository, ImportStatus, JobProgress, Result,
};

/// PostgreSQL implementation of ImportJobRepository.
pub struct PgImportJobRepository {
    pool: Pool<Postgres>,
}

impl PgImportJobRepository {
    /// Create a new PgImportJobRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a job row into an ImportJob struct.
    fn parse_job_row(row: sqlx::postgres::PgRow) -> Result<ImportJob> {
        let summary: serde_json::Value = row.get("error_summary");
        let error_summary: HashMap<String, i64> = serde_json::from_value(summary)?;

        Ok(ImportJob {
            id: row.get("id"),
            status: ImportStatus::from_str_lossy(row.get("status")),
            source_name: row.get("source_name"),
            total_rows: row.get("total_rows"),
            processed_rows: row.get("processed_rows"),
            succeeded_rows: row.get("succeeded_rows"),
            failed_rows: row.get("failed_rows"),
            error_summary,
            failure_reason: row.get("failure_reason"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
            progress_persisted_at: row.get("progress_persisted_at"),
        })
    }
}

#[async_trait]
impl ImportJobRepository for PgImportJobRepository {
    async fn create(&self, source_name: &str, total_rows: i64) -> Result<ImportJob> {
        let id = new_v7();
        let now = Utc::now();

        sqlx::query(
            "INSERT INTO import_job
                 (id, status, source_name, total_rows, processed_rows, succeeded_rows,
                  failed_rows, error_summary, failure_reason, created_at, updated_at)
             VALUES ($1, $2, $3, $4, 0, 0, 0, '{}'::jsonb, NULL, $5, $5)",
        )
        .bind(id)
        .bind(ImportStatus::Pending.as_str())
        .bind(source_name)
        .bind(total_rows)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(ImportJob {
            id,
            status: ImportStatus::Pending,
            source_name: source_name.to_string(),
            total_rows,
            processed_rows: 0,
            succeeded_rows: 0,
            failed_rows: 0,
            error_summary: HashMap::new(),
            failure_reason: None,
            created_at: now,
            updated_at: now,
            progress_persisted_at: None,
        })
    }

    async fn mark_running(&self, job_id: Uuid) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE import_job SET status = $2, updated_at = $3 WHERE id = $1",
        )
        .bind(job_id)
        .bind(ImportStatus::Running.as_str())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::JobNotFound(job_id));
        }
        Ok(())
    }

    async fn update_progress(&self, job_id: Uuid, progress: &JobProgress) -> Result<()> {
        let summary = serde_json::to_value(&progress.error_summary)?;

        // GREATEST guards monotonicity: a checkpoint can never regress counts
        // already visible to pollers.
        let updated = sqlx::query(
            "UPDATE import_job SET
                 processed_rows = GREATEST(processed_rows, $2),
                 succeeded_rows = GREATEST(succeeded_rows, $3),
                 failed_rows = GREATEST(failed_rows, $4),
                 error_summary = $5,
                 updated_at = $6,
                 progress_persisted_at = $6
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(progress.processed)
        .bind(progress.succeeded)
        .bind(progress.failed)
        .bind(summary)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::JobNotFound(job_id));
        }
        Ok(())
    }

    async fn finalize(
        &self,
        job_id: Uuid,
        status: ImportStatus,
        progress: &JobProgress,
        failure_reason: Option<&str>,
    ) -> Result<()> {
        if !status.is_terminal() {
            return Err(Error::Job(format!(
                "finalize called with non-terminal status {}",
                status.as_str()
            )));
        }
        let summary = serde_json::to_value(&progress.error_summary)?;

        let updated = sqlx::query(
            "UPDATE import_job SET
                 status = $2,
                 processed_rows = $3,
                 succeeded_rows = $4,
                 failed_rows = $5,
                 error_summary = $6,
                 failure_reason = $7,
                 updated_at = $8,
                 progress_persisted_at = $8
             WHERE id = $1",
        )
        .bind(job_id)
        .bind(status.as_str())
        .bind(progress.processed)
        .bind(progress.succeeded)
        .bind(progress.failed)
        .bind(summary)
        .bind(failure_reason)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::JobNotFound(job_id));
        }
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<ImportJob>> {
        let row = sqlx::query(
            "SELECT id, status, source_name, total_rows, processed_rows, succeeded_rows,
                    failed_rows, error_summary, failure_reason, created_at, updated_at,
                    progress_persisted_at
             FROM import_job WHERE id = $1",
        )
        .bind(job_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(Self::parse_job_row).transpose()
    }
}
