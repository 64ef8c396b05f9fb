//! Resolution workbench.
//!
//! Human triage surface for tokens the automated ladder could not place.
//! Listing pairs each unresolved input with nearest-neighbor suggestions;
//! resolving records a human-confirmed alias, marks the input resolved, and
//! regenerates the target skill's embedding so the mapping takes effect for
//! future imports without another embedding lookup.

use std::sync::Arc;

use tracing::{info, instrument};

use skillmap_core::{
    AliasRepository, AliasSource, CreateAliasRequest, Error, RawSkillInput, RawSkillRepository,
    RawSkillStatus, Result, SkillRepository, SkillSuggestion, Uuid,
};

use crate::maintenance::EmbeddingMaintainer;
use crate::resolver::SkillResolver;

/// One unresolved token with suggested canonical skills.
#[derive(Debug, Clone)]
pub struct WorkbenchItem {
    pub input: RawSkillInput,
    pub suggestions: Vec<SkillSuggestion>,
}

/// Human-in-the-loop resolution over the unresolved token queue.
pub struct ResolutionWorkbench {
    skills: Arc<dyn SkillRepository>,
    aliases: Arc<dyn AliasRepository>,
    raw_skills: Arc<dyn RawSkillRepository>,
    resolver: Arc<SkillResolver>,
    maintainer: Arc<EmbeddingMaintainer>,
}

impl ResolutionWorkbench {
    pub fn new(
        skills: Arc<dyn SkillRepository>,
        aliases: Arc<dyn AliasRepository>,
        raw_skills: Arc<dyn RawSkillRepository>,
        resolver: Arc<SkillResolver>,
        maintainer: Arc<EmbeddingMaintainer>,
    ) -> Self {
        Self {
            skills,
            aliases,
            raw_skills,
            resolver,
            maintainer,
        }
    }

    /// Unresolved inputs for a job, oldest first, each with suggestion
    /// candidates. Suggestion lookup degrades to empty when the embedding
    /// backend is down; the queue itself is always listable.
    #[instrument(skip(self), fields(subsystem = "workbench", component = "workbench", op = "list_unresolved", job_id = %job_id))]
    pub async fn list_unresolved(&self, job_id: Uuid) -> Result<Vec<WorkbenchItem>> {
        let inputs = self.raw_skills.list_unresolved(job_id).await?;
        let mut items = Vec::with_capacity(inputs.len());
        for input in inputs {
            let suggestions = self.resolver.suggestions(&input.raw_text).await?;
            items.push(WorkbenchItem { input, suggestions });
        }
        Ok(items)
    }

    /// Map one unresolved input to a canonical skill.
    ///
    /// Creates a human-sourced alias for the verbatim token first; an alias
    /// key already claimed by a different skill aborts the whole operation
    /// with [`Error::Conflict`] and leaves the input untouched. On success
    /// the input is marked resolved and the skill's embedding regenerated.
    /// Returns the alias id.
    #[instrument(skip(self), fields(subsystem = "workbench", component = "workbench", op = "resolve", skill_id = %skill_id))]
    pub async fn resolve(&self, input_id: Uuid, skill_id: Uuid) -> Result<Uuid> {
        let input = self
            .raw_skills
            .get(input_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("raw skill input {}", input_id)))?;
        if input.status != RawSkillStatus::Unresolved {
            return Err(Error::Conflict(format!(
                "input {} is already {}",
                input_id,
                input.status.as_str()
            )));
        }
        if self.skills.get(skill_id).await?.is_none() {
            return Err(Error::SkillNotFound(skill_id));
        }

        let alias_id = self
            .aliases
            .create(CreateAliasRequest {
                skill_id,
                alias_text: input.raw_text.clone(),
                source: AliasSource::Human,
                confidence: Some(1.0),
            })
            .await?;

        self.raw_skills
            .mark_resolved(input_id, skill_id, RawSkillStatus::HumanResolved)
            .await?;
        self.maintainer.refresh(skill_id).await?;

        info!(
            token = %input.raw_text,
            skill_id = %skill_id,
            "token mapped by human"
        );
        Ok(alias_id)
    }
}
