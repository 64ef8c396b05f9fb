//! Import job orchestration.
//!
//! Owns the job state machine `Pending -> Running -> {Completed,
//! PartialSuccess, Failed}`. One detached tokio task sweeps a job's rows in
//! file order; row-local failures are tallied and never force `Failed`.
//! `Failed` is reserved for infrastructure problems: an unreadable file or a
//! store that stops answering mid-run. Checkpoint writes go through the
//! count/time [`ProgressGate`]; the terminal write never does.

use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use skillmap_core::{
    defaults, EmployeeRepository, ImportJobRepository, ImportStatus, JobProgress,
    MasterDataRepository, RawSkillRepository, Result, RowOutcome,
};
use skillmap_resolve::SkillResolver;

use crate::progress::ProgressGate;
use crate::reader::{parse_roster, ImportRow};
use crate::row::RowProcessor;
use crate::validator::MasterDataValidator;

/// Orchestrator tunables.
#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    /// Persist a checkpoint at least every this many rows.
    pub progress_every_rows: i64,
    /// Persist a checkpoint when this much time has passed since the last.
    pub progress_min_interval: Duration,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            progress_every_rows: defaults::PROGRESS_EVERY_ROWS,
            progress_min_interval: Duration::from_secs(defaults::PROGRESS_EVERY_SECS),
        }
    }
}

impl OrchestratorConfig {
    /// Build from environment variables, falling back to defaults:
    /// - `SKILLMAP_PROGRESS_EVERY_ROWS`
    /// - `SKILLMAP_PROGRESS_EVERY_SECS`
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(v) = std::env::var("SKILLMAP_PROGRESS_EVERY_ROWS") {
            if let Ok(parsed) = v.parse::<i64>() {
                config.progress_every_rows = parsed;
            }
        }
        if let Ok(v) = std::env::var("SKILLMAP_PROGRESS_EVERY_SECS") {
            if let Ok(parsed) = v.parse::<u64>() {
                config.progress_min_interval = Duration::from_secs(parsed);
            }
        }
        config
    }

    pub fn with_progress_every_rows(mut self, rows: i64) -> Self {
        self.progress_every_rows = rows;
        self
    }

    pub fn with_progress_min_interval(mut self, interval: Duration) -> Self {
        self.progress_min_interval = interval;
        self
    }
}

/// Drives bulk roster imports end to end.
pub struct ImportOrchestrator {
    jobs: Arc<dyn ImportJobRepository>,
    employees: Arc<dyn EmployeeRepository>,
    raw_skills: Arc<dyn RawSkillRepository>,
    master_data: Arc<dyn MasterDataRepository>,
    resolver: Arc<SkillResolver>,
    config: OrchestratorConfig,
}

impl ImportOrchestrator {
    pub fn new(
        jobs: Arc<dyn ImportJobRepository>,
        employees: Arc<dyn EmployeeRepository>,
        raw_skills: Arc<dyn RawSkillRepository>,
        master_data: Arc<dyn MasterDataRepository>,
        resolver: Arc<SkillResolver>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            jobs,
            employees,
            raw_skills,
            master_data,
            resolver,
            config,
        }
    }

    /// Parse the source and create the job. An unreadable file still creates
    /// a job, finalized `Failed` with the parse error as reason, so pollers
    /// see the failure.
    async fn create_job(&self, source_name: &str, content: &str) -> Result<(Uuid, Vec<ImportRow>)> {
        match parse_roster(content) {
            Ok(rows) => {
                let job = self.jobs.create(source_name, rows.len() as i64).await?;
                info!(job_id = %job.id, total_rows = rows.len(), source = %source_name, "import job created");
                Ok((job.id, rows))
            }
            Err(e) => {
                let job = self.jobs.create(source_name, 0).await?;
                error!(job_id = %job.id, source = %source_name, error = %e, "roster file unreadable");
                self.jobs
                    .finalize(
                        job.id,
                        ImportStatus::Failed,
                        &JobProgress::default(),
                        Some(&e.to_string()),
                    )
                    .await?;
                Ok((job.id, Vec::new()))
            }
        }
    }

    /// Create the job and build its sweep. `None` means there is nothing to
    /// sweep: the job is already terminal (unreadable file, or an empty
    /// roster completed trivially).
    async fn prepare(&self, source_name: &str, content: &str) -> Result<(Uuid, Option<Sweep>)> {
        let (job_id, rows) = self.create_job(source_name, content).await?;
        if rows.is_empty() {
            // Unreadable file was already finalized Failed.
            if self.jobs.get(job_id).await?.map(|j| j.status) == Some(ImportStatus::Pending) {
                self.jobs
                    .finalize(job_id, ImportStatus::Completed, &JobProgress::default(), None)
                    .await?;
            }
            return Ok((job_id, None));
        }

        let sweep = Sweep {
            job_id,
            rows,
            jobs: self.jobs.clone(),
            processor: self.processor_for(job_id),
            gate: ProgressGate::with_config(
                self.config.progress_every_rows,
                self.config.progress_min_interval,
            ),
        };
        Ok((job_id, Some(sweep)))
    }

    /// Start an import: create the job, spawn the sweep, return the job id
    /// immediately. Progress is observed through the job status reader.
    pub async fn start(&self, source_name: &str, content: &str) -> Result<Uuid> {
        let (job_id, sweep) = self.prepare(source_name, content).await?;
        if let Some(sweep) = sweep {
            tokio::spawn(sweep.run());
        }
        Ok(job_id)
    }

    /// Run an import inline, returning the job id after the sweep finishes.
    pub async fn run_to_completion(&self, source_name: &str, content: &str) -> Result<Uuid> {
        let (job_id, sweep) = self.prepare(source_name, content).await?;
        if let Some(sweep) = sweep {
            sweep.run().await;
        }
        Ok(job_id)
    }

    fn processor_for(&self, job_id: Uuid) -> RowProcessor {
        RowProcessor::new(
            job_id,
            self.employees.clone(),
            self.raw_skills.clone(),
            self.resolver.clone(),
            MasterDataValidator::new(self.master_data.clone()),
        )
    }
}

/// One job's row sweep with its own processor, gate, and counters.
struct Sweep {
    job_id: Uuid,
    rows: Vec<ImportRow>,
    jobs: Arc<dyn ImportJobRepository>,
    processor: RowProcessor,
    gate: ProgressGate,
}

impl Sweep {
    #[instrument(skip(self), fields(subsystem = "import", component = "orchestrator", op = "sweep", job_id = %self.job_id))]
    async fn run(mut self) {
        if let Err(e) = self.jobs.mark_running(self.job_id).await {
            error!(job_id = %self.job_id, error = %e, "could not mark job running");
            self.finalize_failed(&JobProgress::default(), &e.to_string())
                .await;
            return;
        }

        let mut progress = JobProgress::default();
        for (index, row) in std::mem::take(&mut self.rows).into_iter().enumerate() {
            let row_number = index as i64 + 1;
            let outcome = match self.processor.process(row_number, &row).await {
                Ok(outcome) => outcome,
                Err(e) => {
                    // Store errors during resolution mean the run cannot
                    // continue; committed rows stay committed.
                    error!(job_id = %self.job_id, row_number, error = %e, "sweep aborted");
                    self.finalize_failed(&progress, &e.to_string()).await;
                    return;
                }
            };
            tally(&mut progress, &outcome);

            if self.gate.should_persist(progress.processed) {
                match self.jobs.update_progress(self.job_id, &progress).await {
                    Ok(()) => self.gate.written(progress.processed),
                    Err(e) => {
                        error!(job_id = %self.job_id, error = %e, "checkpoint write failed, aborting sweep");
                        self.finalize_failed(&progress, &e.to_string()).await;
                        return;
                    }
                }
            }
        }

        // Row-local failures never force Failed; a fully failed sweep is
        // still PartialSuccess.
        let status = if progress.failed == 0 {
            ImportStatus::Completed
        } else {
            ImportStatus::PartialSuccess
        };
        match self
            .jobs
            .finalize(self.job_id, status, &progress, None)
            .await
        {
            Ok(()) => info!(
                job_id = %self.job_id,
                status = status.as_str(),
                processed = progress.processed,
                succeeded = progress.succeeded,
                failed = progress.failed,
                "import job finalized"
            ),
            Err(e) => error!(job_id = %self.job_id, error = %e, "terminal write failed"),
        }
    }

    async fn finalize_failed(&self, progress: &JobProgress, reason: &str) {
        if let Err(e) = self
            .jobs
            .finalize(self.job_id, ImportStatus::Failed, progress, Some(reason))
            .await
        {
            warn!(job_id = %self.job_id, error = %e, "best-effort failure finalization also failed");
        }
    }
}

fn tally(progress: &mut JobProgress, outcome: &RowOutcome) {
    progress.processed += 1;
    match &outcome.error {
        None => progress.succeeded += 1,
        Some(error) => {
            progress.failed += 1;
            *progress
                .error_summary
                .entry(error.code.as_str().to_string())
                .or_insert(0) += 1;
        }
    }
}
