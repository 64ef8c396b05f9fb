//! Job status reads for pollers.

use std::sync::Arc;

use uuid::Uuid;

use skillmap_core::{Error, ImportJobRepository, JobStatusView, Result};

/// Read-only view over import jobs. Reflects the last persisted checkpoint,
/// which may trail the sweep by up to one gate interval while running.
pub struct JobStatusReader {
    jobs: Arc<dyn ImportJobRepository>,
}

impl JobStatusReader {
    pub fn new(jobs: Arc<dyn ImportJobRepository>) -> Self {
        Self { jobs }
    }

    /// Current state, counts, and error-code breakdown for a job.
    pub async fn status(&self, job_id: Uuid) -> Result<JobStatusView> {
        let job = self
            .jobs
            .get(job_id)
            .await?
            .ok_or(Error::JobNotFound(job_id))?;
        Ok(job.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillmap_core::{new_v7, ImportStatus, JobProgress};
    use skillmap_db::MemoryStore;

    #[tokio::test]
    async fn test_status_reflects_persisted_checkpoint() {
        let store = Arc::new(MemoryStore::new());
        let job = ImportJobRepository::create(store.as_ref(), "r.csv", 4)
            .await
            .unwrap();
        store.mark_running(job.id).await.unwrap();
        store
            .update_progress(
                job.id,
                &JobProgress {
                    processed: 2,
                    succeeded: 2,
                    failed: 0,
                    error_summary: Default::default(),
                },
            )
            .await
            .unwrap();

        let reader = JobStatusReader::new(store.clone());
        let view = reader.status(job.id).await.unwrap();
        assert_eq!(view.status, ImportStatus::Running);
        assert_eq!(view.total_rows, 4);
        assert_eq!(view.processed_rows, 2);
    }

    #[tokio::test]
    async fn test_unknown_job_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        let reader = JobStatusReader::new(store);
        let err = reader.status(new_v7()).await.unwrap_err();
        assert!(matches!(err, Error::JobNotFound(_)));
    }
}
