//! Hierarchical master-data validation.
//!
//! Checks the organizational context a row declares: every entity must
//! exist, the project must belong to the claimed sub-unit, and the team to
//! the claimed project. Lookups are memoized per validator instance; one
//! validator is constructed per job execution and never shared across jobs,
//! so a cache entry can never outlive the run that observed it.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::trace;

use skillmap_core::{
    normalize, MasterDataRepository, Project, ResolvedContext, Result, Role, RowContext, RowError,
    RowErrorCode, SubUnit, Team, ValidationResult,
};

/// Per-job master-data validator with memoized lookups. Negative results
/// are cached too; master data is read-only for the duration of a run.
pub struct MasterDataValidator {
    store: Arc<dyn MasterDataRepository>,
    sub_units: HashMap<String, Option<SubUnit>>,
    projects: HashMap<String, Option<Project>>,
    teams: HashMap<String, Option<Team>>,
    roles: HashMap<String, Option<Role>>,
}

impl MasterDataValidator {
    pub fn new(store: Arc<dyn MasterDataRepository>) -> Self {
        Self {
            store,
            sub_units: HashMap::new(),
            projects: HashMap::new(),
            teams: HashMap::new(),
            roles: HashMap::new(),
        }
    }

    async fn sub_unit(&mut self, key: &str) -> Result<Option<SubUnit>> {
        if let Some(cached) = self.sub_units.get(key) {
            trace!(key = %key, "sub-unit cache hit");
            return Ok(cached.clone());
        }
        let found = self.store.sub_unit_by_name(key).await?;
        self.sub_units.insert(key.to_string(), found.clone());
        Ok(found)
    }

    async fn project(&mut self, key: &str) -> Result<Option<Project>> {
        if let Some(cached) = self.projects.get(key) {
            return Ok(cached.clone());
        }
        let found = self.store.project_by_name(key).await?;
        self.projects.insert(key.to_string(), found.clone());
        Ok(found)
    }

    async fn team(&mut self, key: &str) -> Result<Option<Team>> {
        if let Some(cached) = self.teams.get(key) {
            return Ok(cached.clone());
        }
        let found = self.store.team_by_name(key).await?;
        self.teams.insert(key.to_string(), found.clone());
        Ok(found)
    }

    async fn role(&mut self, key: &str) -> Result<Option<Role>> {
        if let Some(cached) = self.roles.get(key) {
            return Ok(cached.clone());
        }
        let found = self.store.role_by_name(key).await?;
        self.roles.insert(key.to_string(), found.clone());
        Ok(found)
    }

    /// Validate one row's declared context. Business misses come back as
    /// `ValidationResult::Invalid`; only store failures are `Err`.
    pub async fn validate(&mut self, context: &RowContext) -> Result<ValidationResult> {
        let sub_unit = match self.sub_unit(&normalize(&context.sub_unit)).await? {
            Some(found) => found,
            None => {
                return Ok(ValidationResult::Invalid(RowError::new(
                    RowErrorCode::SubUnitNotFound,
                    format!("sub-unit '{}' not found", context.sub_unit),
                )))
            }
        };

        let project = match self.project(&normalize(&context.project)).await? {
            Some(found) => found,
            None => {
                return Ok(ValidationResult::Invalid(RowError::new(
                    RowErrorCode::ProjectNotFound,
                    format!("project '{}' not found", context.project),
                )))
            }
        };
        if project.sub_unit_id != sub_unit.id {
            return Ok(ValidationResult::Invalid(RowError::new(
                RowErrorCode::HierarchyMismatch,
                format!(
                    "project '{}' does not belong to sub-unit '{}'",
                    context.project, context.sub_unit
                ),
            )));
        }

        let team = match self.team(&normalize(&context.team)).await? {
            Some(found) => found,
            None => {
                return Ok(ValidationResult::Invalid(RowError::new(
                    RowErrorCode::TeamNotFound,
                    format!("team '{}' not found", context.team),
                )))
            }
        };
        if team.project_id != project.id {
            return Ok(ValidationResult::Invalid(RowError::new(
                RowErrorCode::HierarchyMismatch,
                format!(
                    "team '{}' does not belong to project '{}'",
                    context.team, context.project
                ),
            )));
        }

        let role = match self.role(&normalize(&context.role)).await? {
            Some(found) => found,
            None => {
                return Ok(ValidationResult::Invalid(RowError::new(
                    RowErrorCode::RoleNotFound,
                    format!("role '{}' not found", context.role),
                )))
            }
        };

        Ok(ValidationResult::Valid(ResolvedContext {
            sub_unit_id: sub_unit.id,
            project_id: project.id,
            team_id: team.id,
            role_id: role.id,
        }))
    }
}
