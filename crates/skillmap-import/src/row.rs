//! Per-row import pipeline.
//!
//! sanitize -> duplicate check -> master-data validation -> skill token
//! resolution -> persistence. Business failures end the row with a
//! [`RowError`] carried in the outcome; the sweep continues. Persistence
//! failures are likewise row-local (`PersistFailed`); the orchestrator's own
//! checkpoint writes are what decide whether the store is gone entirely.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;
use tracing::{trace, warn};

use skillmap_core::{
    new_v7, normalize, EmployeeRecord, EmployeeRepository, RawSkillRepository, RawSkillStatus,
    ResolutionTier, Result, RowContext, RowError, RowErrorCode, RowOutcome, SkillAssignment,
    ValidationResult,
};
use skillmap_resolve::SkillResolver;

use crate::reader::ImportRow;
use crate::sanitize::{sanitize_fields, split_skill_tokens, SanitizedFields};
use crate::validator::MasterDataValidator;

fn raw_status_for(tier: ResolutionTier) -> RawSkillStatus {
    match tier {
        ResolutionTier::Exact => RawSkillStatus::ExactMatched,
        ResolutionTier::Alias => RawSkillStatus::AliasMatched,
        ResolutionTier::Semantic => RawSkillStatus::AutoMatched,
        ResolutionTier::Unresolved => RawSkillStatus::Unresolved,
    }
}

/// Processes the rows of one import job, in file order. Owns the per-job
/// validator cache and the duplicate-reference set.
pub struct RowProcessor {
    job_id: uuid::Uuid,
    employees: Arc<dyn EmployeeRepository>,
    raw_skills: Arc<dyn RawSkillRepository>,
    resolver: Arc<SkillResolver>,
    validator: MasterDataValidator,
    seen_refs: HashSet<String>,
}

impl RowProcessor {
    pub fn new(
        job_id: uuid::Uuid,
        employees: Arc<dyn EmployeeRepository>,
        raw_skills: Arc<dyn RawSkillRepository>,
        resolver: Arc<SkillResolver>,
        validator: MasterDataValidator,
    ) -> Self {
        Self {
            job_id,
            employees,
            raw_skills,
            resolver,
            validator,
            seen_refs: HashSet::new(),
        }
    }

    /// Process one row. `row_number` is 1-based file order. Only store
    /// errors during resolution propagate as `Err`.
    pub async fn process(&mut self, row_number: i64, row: &ImportRow) -> Result<RowOutcome> {
        let fields = match sanitize_fields(
            row.external_ref.as_deref(),
            row.full_name.as_deref(),
            row.email.as_deref(),
            row.hired_on.as_deref(),
            row.allocation.as_deref(),
        ) {
            Ok(fields) => fields,
            Err(error) => return Ok(self.failed(row_number, error)),
        };

        // First row to claim a reference wins, even if it later fails.
        if !self.seen_refs.insert(normalize(&fields.external_ref)) {
            return Ok(self.failed(
                row_number,
                RowError::new(
                    RowErrorCode::DuplicateInFile,
                    format!("employee '{}' appears earlier in the file", fields.external_ref),
                ),
            ));
        }

        let context = RowContext {
            sub_unit: row.sub_unit.clone().unwrap_or_default(),
            project: row.project.clone().unwrap_or_default(),
            team: row.team.clone().unwrap_or_default(),
            role: row.role.clone().unwrap_or_default(),
        };
        let resolved_context = match self.validator.validate(&context).await? {
            ValidationResult::Valid(resolved) => resolved,
            ValidationResult::Invalid(error) => return Ok(self.failed(row_number, error)),
        };

        let tokens = split_skill_tokens(row.skills.as_deref());
        let mut resolutions = Vec::with_capacity(tokens.len());
        for token in &tokens {
            let resolution = self.resolver.resolve(token).await?;
            trace!(
                row_number,
                token = %token,
                tier = resolution.tier.as_str(),
                "token resolved"
            );
            resolutions.push((token.clone(), resolution));
        }
        let resolved_skills = resolutions.iter().filter(|(_, r)| r.is_resolved()).count();
        let unresolved_tokens = resolutions.len() - resolved_skills;

        let employee = EmployeeRecord {
            id: new_v7(),
            job_id: self.job_id,
            external_ref: fields.external_ref.clone(),
            full_name: fields.full_name.clone(),
            email: fields.email.clone(),
            hired_on: fields.hired_on,
            allocation_pct: fields.allocation_pct,
            sub_unit_id: resolved_context.sub_unit_id,
            project_id: resolved_context.project_id,
            team_id: resolved_context.team_id,
            role_id: resolved_context.role_id,
            created_at: Utc::now(),
        };

        match self.persist(&employee, &fields, &resolutions).await {
            Ok(()) => Ok(RowOutcome {
                row_number,
                employee_id: Some(employee.id),
                error: None,
                resolved_skills,
                unresolved_tokens,
            }),
            Err(e) => {
                warn!(row_number, error = %e, "row persistence failed");
                Ok(self.failed(
                    row_number,
                    RowError::new(RowErrorCode::PersistFailed, e.to_string()),
                ))
            }
        }
    }

    async fn persist(
        &self,
        employee: &EmployeeRecord,
        fields: &SanitizedFields,
        resolutions: &[(String, skillmap_core::Resolution)],
    ) -> Result<()> {
        let employee_id = self.employees.insert(employee).await?;

        for (token, resolution) in resolutions {
            let key = normalize(token);
            self.raw_skills
                .enqueue(
                    self.job_id,
                    token,
                    &key,
                    raw_status_for(resolution.tier),
                    resolution.skill_id,
                )
                .await?;

            if let Some(skill_id) = resolution.skill_id {
                self.employees
                    .add_skill(&SkillAssignment {
                        id: new_v7(),
                        employee_id,
                        skill_id,
                        tier: resolution.tier,
                        score: resolution.score,
                    })
                    .await?;
            }
        }
        trace!(
            employee_ref = %fields.external_ref,
            tokens = resolutions.len(),
            "row persisted"
        );
        Ok(())
    }

    fn failed(&self, row_number: i64, error: RowError) -> RowOutcome {
        RowOutcome {
            row_number,
            employee_id: None,
            error: Some(error),
            resolved_skills: 0,
            unresolved_tokens: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skillmap_core::ImportJobRepository;
    use skillmap_db::MemoryStore;
    use skillmap_resolve::{MockEmbeddingBackend, ResolverConfig};

    async fn processor_over(store: &Arc<MemoryStore>) -> RowProcessor {
        let unit = store.seed_sub_unit("Engineering").await;
        let project = store.seed_project(unit.id, "Atlas").await;
        store.seed_team(project.id, "Core").await;
        store.seed_role("Developer").await;

        let job = ImportJobRepository::create(store.as_ref(), "r.csv", 10)
            .await
            .unwrap();
        let backend = Arc::new(MockEmbeddingBackend::new(4));
        let resolver = Arc::new(SkillResolver::new(
            store.clone(),
            store.clone(),
            store.clone(),
            backend,
            ResolverConfig::default(),
        ));
        RowProcessor::new(
            job.id,
            store.clone(),
            store.clone(),
            resolver,
            MasterDataValidator::new(store.clone()),
        )
    }

    fn valid_row(external_ref: &str, skills: &str) -> ImportRow {
        ImportRow {
            external_ref: Some(external_ref.to_string()),
            full_name: Some("Ada Lovelace".to_string()),
            email: Some("ada@example.com".to_string()),
            hired_on: Some("2024-01-15".to_string()),
            allocation: Some("100".to_string()),
            sub_unit: Some("Engineering".to_string()),
            project: Some("Atlas".to_string()),
            team: Some("Core".to_string()),
            role: Some("Developer".to_string()),
            skills: Some(skills.to_string()),
        }
    }

    #[tokio::test]
    async fn test_row_with_exact_skill_persists_assignment() {
        let store = Arc::new(MemoryStore::new());
        let rust = store.seed_skill("Rust").await;
        let mut processor = processor_over(&store).await;

        let outcome = processor.process(1, &valid_row("E-1", "rust")).await.unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.resolved_skills, 1);
        assert_eq!(outcome.unresolved_tokens, 0);

        let employee = store.employee_by_ref("E-1").await.unwrap();
        let assignments = store.assignments_for(employee.id).await;
        assert_eq!(assignments.len(), 1);
        assert_eq!(assignments[0].skill_id, rust);
        assert_eq!(assignments[0].tier, ResolutionTier::Exact);
    }

    #[tokio::test]
    async fn test_zero_resolvable_skills_still_persists_employee() {
        let store = Arc::new(MemoryStore::new());
        let mut processor = processor_over(&store).await;

        let outcome = processor
            .process(1, &valid_row("E-1", "underwater basket weaving"))
            .await
            .unwrap();
        assert!(outcome.succeeded());
        assert_eq!(outcome.resolved_skills, 0);
        assert_eq!(outcome.unresolved_tokens, 1);
        assert!(store.employee_by_ref("E-1").await.is_some());

        let unresolved = store.list_unresolved(processor.job_id).await.unwrap();
        assert_eq!(unresolved.len(), 1);
        assert_eq!(unresolved[0].raw_text, "underwater basket weaving");
    }

    #[tokio::test]
    async fn test_duplicate_ref_fails_second_row_only() {
        let store = Arc::new(MemoryStore::new());
        store.seed_skill("Rust").await;
        let mut processor = processor_over(&store).await;

        let first = processor.process(1, &valid_row("E-1", "rust")).await.unwrap();
        let second = processor.process(2, &valid_row("E-1", "rust")).await.unwrap();
        assert!(first.succeeded());
        assert_eq!(
            second.error.unwrap().code,
            RowErrorCode::DuplicateInFile
        );
        assert_eq!(store.employee_count().await, 1);
    }

    #[tokio::test]
    async fn test_sanitize_failure_skips_whole_row() {
        let store = Arc::new(MemoryStore::new());
        store.seed_skill("Rust").await;
        let mut processor = processor_over(&store).await;

        let mut row = valid_row("E-1", "rust");
        row.hired_on = Some("not a date".to_string());
        let outcome = processor.process(1, &row).await.unwrap();

        assert_eq!(outcome.error.unwrap().code, RowErrorCode::MalformedDate);
        assert_eq!(store.employee_count().await, 0);
        assert!(store.list_unresolved(processor.job_id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_team_fails_row() {
        let store = Arc::new(MemoryStore::new());
        let mut processor = processor_over(&store).await;

        let mut row = valid_row("E-1", "");
        row.team = Some("Ghosts".to_string());
        let outcome = processor.process(1, &row).await.unwrap();
        assert_eq!(outcome.error.unwrap().code, RowErrorCode::TeamNotFound);
    }
}
