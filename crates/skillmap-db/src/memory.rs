//! In-memory implementations of the core repository traits.
//!
//! Note: always compiled (not test-gated) so integration tests in downstream
//! crates can exercise the full pipeline without a PostgreSQL instance. One
//! [`MemoryStore`] implements every repository trait; clone it and coerce to
//! the `Arc<dyn Trait>` each component wants.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use skillmap_db::memory::MemoryStore;
//!
//! let store = Arc::new(MemoryStore::new());
//! let sub_unit = store.seed_sub_unit("Engineering").await;
//! ```

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use pgvector::Vector;
use tokio::sync::RwLock;
use uuid::Uuid;

use skillmap_core::{
    new_v7, normalize, AliasRepository, CreateAliasRequest, CreateSkillRequest, EmployeeRecord,
    EmployeeRepository, Error, ImportJob, ImportJobRepository, ImportStatus, JobProgress,
    MasterDataRepository, Project, RawSkillInput, RawSkillRepository, RawSkillStatus, Result,
    Role, Skill, SkillAlias, SkillAssignment, SkillEmbedding, SkillEmbeddingRepository, SkillHit,
    SkillRepository, SubUnit, Team,
};

/// Cosine similarity between two vectors; 0.0 when either norm is zero.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[derive(Default)]
struct MemoryState {
    skills: RwLock<HashMap<Uuid, Skill>>,
    aliases: RwLock<HashMap<Uuid, SkillAlias>>,
    embeddings: RwLock<HashMap<Uuid, SkillEmbedding>>,
    jobs: RwLock<HashMap<Uuid, ImportJob>>,
    raw_skills: RwLock<HashMap<Uuid, RawSkillInput>>,
    sub_units: RwLock<Vec<SubUnit>>,
    projects: RwLock<Vec<Project>>,
    teams: RwLock<Vec<Team>>,
    roles: RwLock<Vec<Role>>,
    employees: RwLock<HashMap<Uuid, EmployeeRecord>>,
    assignments: RwLock<Vec<SkillAssignment>>,
    /// Master-data lookups served, for cache-behavior assertions.
    master_lookups: AtomicU64,
}

/// In-memory data store implementing every repository trait.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<MemoryState>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of master-data lookups served so far. The per-job validator
    /// cache should keep this flat across repeated rows.
    pub fn master_lookup_count(&self) -> u64 {
        self.state.master_lookups.load(Ordering::SeqCst)
    }

    // ── Seeding helpers ────────────────────────────────────────────────

    pub async fn seed_sub_unit(&self, name: &str) -> SubUnit {
        let unit = SubUnit {
            id: new_v7(),
            name: name.to_string(),
        };
        self.state.sub_units.write().await.push(unit.clone());
        unit
    }

    pub async fn seed_project(&self, sub_unit_id: Uuid, name: &str) -> Project {
        let project = Project {
            id: new_v7(),
            sub_unit_id,
            name: name.to_string(),
        };
        self.state.projects.write().await.push(project.clone());
        project
    }

    pub async fn seed_team(&self, project_id: Uuid, name: &str) -> Team {
        let team = Team {
            id: new_v7(),
            project_id,
            name: name.to_string(),
        };
        self.state.teams.write().await.push(team.clone());
        team
    }

    pub async fn seed_role(&self, name: &str) -> Role {
        let role = Role {
            id: new_v7(),
            name: name.to_string(),
        };
        self.state.roles.write().await.push(role.clone());
        role
    }

    /// Seed a canonical skill under a fabricated subcategory.
    pub async fn seed_skill(&self, name: &str) -> Uuid {
        SkillRepository::create(
            self,
            CreateSkillRequest {
                subcategory_id: new_v7(),
                name: name.to_string(),
            },
        )
        .await
        .expect("seed_skill")
    }

    // ── Assertion helpers ──────────────────────────────────────────────

    pub async fn employee_by_ref(&self, external_ref: &str) -> Option<EmployeeRecord> {
        self.state
            .employees
            .read()
            .await
            .values()
            .find(|e| e.external_ref == external_ref)
            .cloned()
    }

    pub async fn assignments_for(&self, employee_id: Uuid) -> Vec<SkillAssignment> {
        self.state
            .assignments
            .read()
            .await
            .iter()
            .filter(|a| a.employee_id == employee_id)
            .cloned()
            .collect()
    }

    pub async fn employee_count(&self) -> usize {
        self.state.employees.read().await.len()
    }
}

// =============================================================================
// SKILLS
// =============================================================================

#[async_trait]
impl SkillRepository for MemoryStore {
    async fn create(&self, req: CreateSkillRequest) -> Result<Uuid> {
        let key = normalize(&req.name);
        if key.is_empty() {
            return Err(Error::InvalidInput("skill name is empty".into()));
        }
        let id = new_v7();
        let now = Utc::now();
        self.state.skills.write().await.insert(
            id,
            Skill {
                id,
                subcategory_id: req.subcategory_id,
                name: req.name,
                normalized_name: key,
                created_at: now,
                updated_at: now,
            },
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Skill>> {
        Ok(self.state.skills.read().await.get(&id).cloned())
    }

    async fn get_by_key(&self, normalized_name: &str) -> Result<Option<Skill>> {
        Ok(self
            .state
            .skills
            .read()
            .await
            .values()
            .find(|s| s.normalized_name == normalized_name)
            .cloned())
    }

    async fn rename(&self, id: Uuid, new_name: &str) -> Result<()> {
        let key = normalize(new_name);
        if key.is_empty() {
            return Err(Error::InvalidInput("skill name is empty".into()));
        }
        {
            let mut skills = self.state.skills.write().await;
            let skill = skills.get_mut(&id).ok_or(Error::SkillNotFound(id))?;
            skill.name = new_name.to_string();
            skill.normalized_name = key;
            skill.updated_at = Utc::now();
        }
        if let Some(emb) = self.state.embeddings.write().await.get_mut(&id) {
            emb.stale = true;
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Skill>> {
        let mut skills: Vec<Skill> = self.state.skills.read().await.values().cloned().collect();
        skills.sort_by(|a, b| a.normalized_name.cmp(&b.normalized_name));
        Ok(skills)
    }
}

// =============================================================================
// ALIASES
// =============================================================================

#[async_trait]
impl AliasRepository for MemoryStore {
    async fn create(&self, req: CreateAliasRequest) -> Result<Uuid> {
        let key = normalize(&req.alias_text);
        if key.is_empty() {
            return Err(Error::InvalidInput("alias text is empty".into()));
        }

        let mut aliases = self.state.aliases.write().await;
        if let Some(existing) = aliases.values().find(|a| a.normalized_key == key) {
            if existing.skill_id == req.skill_id {
                return Ok(existing.id);
            }
            return Err(Error::Conflict(format!(
                "alias '{}' already belongs to skill {}",
                req.alias_text, existing.skill_id
            )));
        }

        let id = new_v7();
        aliases.insert(
            id,
            SkillAlias {
                id,
                skill_id: req.skill_id,
                alias_text: req.alias_text,
                normalized_key: key,
                source: req.source,
                confidence: req.confidence,
                created_at: Utc::now(),
            },
        );
        drop(aliases);

        if let Some(emb) = self.state.embeddings.write().await.get_mut(&req.skill_id) {
            emb.stale = true;
        }
        Ok(id)
    }

    async fn get_by_key(&self, normalized_key: &str) -> Result<Option<SkillAlias>> {
        Ok(self
            .state
            .aliases
            .read()
            .await
            .values()
            .find(|a| a.normalized_key == normalized_key)
            .cloned())
    }

    async fn list_for_skill(&self, skill_id: Uuid) -> Result<Vec<SkillAlias>> {
        let mut list: Vec<SkillAlias> = self
            .state
            .aliases
            .read()
            .await
            .values()
            .filter(|a| a.skill_id == skill_id)
            .cloned()
            .collect();
        list.sort_by(|a, b| a.normalized_key.cmp(&b.normalized_key));
        Ok(list)
    }

    async fn update_text(&self, id: Uuid, new_text: &str) -> Result<()> {
        let key = normalize(new_text);
        if key.is_empty() {
            return Err(Error::InvalidInput("alias text is empty".into()));
        }

        let skill_id = {
            let mut aliases = self.state.aliases.write().await;
            if let Some(other) = aliases
                .values()
                .find(|a| a.normalized_key == key && a.id != id)
            {
                return Err(Error::Conflict(format!(
                    "alias '{}' already belongs to skill {}",
                    new_text, other.skill_id
                )));
            }
            let alias = aliases
                .get_mut(&id)
                .ok_or_else(|| Error::NotFound(format!("alias {}", id)))?;
            alias.alias_text = new_text.to_string();
            alias.normalized_key = key;
            alias.skill_id
        };

        if let Some(emb) = self.state.embeddings.write().await.get_mut(&skill_id) {
            emb.stale = true;
        }
        Ok(())
    }

    async fn set_confidence(&self, id: Uuid, confidence: Option<f32>) -> Result<()> {
        // Metadata-only change: staleness untouched.
        let mut aliases = self.state.aliases.write().await;
        let alias = aliases
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("alias {}", id)))?;
        alias.confidence = confidence;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let alias = self
            .state
            .aliases
            .write()
            .await
            .remove(&id)
            .ok_or_else(|| Error::NotFound(format!("alias {}", id)))?;
        if let Some(emb) = self.state.embeddings.write().await.get_mut(&alias.skill_id) {
            emb.stale = true;
        }
        Ok(())
    }
}

// =============================================================================
// EMBEDDINGS
// =============================================================================

#[async_trait]
impl SkillEmbeddingRepository for MemoryStore {
    async fn upsert(&self, skill_id: Uuid, vector: Vector, model: &str) -> Result<()> {
        self.state.embeddings.write().await.insert(
            skill_id,
            SkillEmbedding {
                skill_id,
                vector,
                model: model.to_string(),
                stale: false,
                updated_at: Utc::now(),
            },
        );
        Ok(())
    }

    async fn mark_stale(&self, skill_id: Uuid) -> Result<()> {
        if let Some(emb) = self.state.embeddings.write().await.get_mut(&skill_id) {
            emb.stale = true;
        }
        Ok(())
    }

    async fn get(&self, skill_id: Uuid) -> Result<Option<SkillEmbedding>> {
        Ok(self.state.embeddings.read().await.get(&skill_id).cloned())
    }

    async fn list_stale(&self) -> Result<Vec<Uuid>> {
        Ok(self
            .state
            .embeddings
            .read()
            .await
            .values()
            .filter(|e| e.stale)
            .map(|e| e.skill_id)
            .collect())
    }

    async fn find_similar(&self, query: &Vector, top_k: i64) -> Result<Vec<SkillHit>> {
        let mut hits: Vec<SkillHit> = self
            .state
            .embeddings
            .read()
            .await
            .values()
            .filter(|e| !e.stale)
            .map(|e| SkillHit {
                skill_id: e.skill_id,
                score: cosine_similarity(query.as_slice(), e.vector.as_slice()),
            })
            .collect();
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        hits.truncate(top_k.max(0) as usize);
        Ok(hits)
    }
}

// =============================================================================
// IMPORT JOBS
// =============================================================================

#[async_trait]
impl ImportJobRepository for MemoryStore {
    async fn create(&self, source_name: &str, total_rows: i64) -> Result<ImportJob> {
        let now = Utc::now();
        let job = ImportJob {
            id: new_v7(),
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
        };
        self.state.jobs.write().await.insert(job.id, job.clone());
        Ok(job)
    }

    async fn mark_running(&self, job_id: Uuid) -> Result<()> {
        let mut jobs = self.state.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(Error::JobNotFound(job_id))?;
        job.status = ImportStatus::Running;
        job.updated_at = Utc::now();
        Ok(())
    }

    async fn update_progress(&self, job_id: Uuid, progress: &JobProgress) -> Result<()> {
        let mut jobs = self.state.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(Error::JobNotFound(job_id))?;
        // Checkpoints never regress counts already visible to pollers.
        job.processed_rows = job.processed_rows.max(progress.processed);
        job.succeeded_rows = job.succeeded_rows.max(progress.succeeded);
        job.failed_rows = job.failed_rows.max(progress.failed);
        job.error_summary = progress.error_summary.clone();
        let now = Utc::now();
        job.updated_at = now;
        job.progress_persisted_at = Some(now);
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
        let mut jobs = self.state.jobs.write().await;
        let job = jobs.get_mut(&job_id).ok_or(Error::JobNotFound(job_id))?;
        job.status = status;
        job.processed_rows = progress.processed;
        job.succeeded_rows = progress.succeeded;
        job.failed_rows = progress.failed;
        job.error_summary = progress.error_summary.clone();
        job.failure_reason = failure_reason.map(String::from);
        let now = Utc::now();
        job.updated_at = now;
        job.progress_persisted_at = Some(now);
        Ok(())
    }

    async fn get(&self, job_id: Uuid) -> Result<Option<ImportJob>> {
        Ok(self.state.jobs.read().await.get(&job_id).cloned())
    }
}

// =============================================================================
// RAW SKILL INPUTS
// =============================================================================

#[async_trait]
impl RawSkillRepository for MemoryStore {
    async fn enqueue(
        &self,
        job_id: Uuid,
        raw_text: &str,
        normalized_key: &str,
        status: RawSkillStatus,
        resolved_skill_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let id = new_v7();
        let now = Utc::now();
        self.state.raw_skills.write().await.insert(
            id,
            RawSkillInput {
                id,
                job_id,
                raw_text: raw_text.to_string(),
                normalized_key: normalized_key.to_string(),
                status,
                resolved_skill_id,
                created_at: now,
                resolved_at: resolved_skill_id.map(|_| now),
            },
        );
        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RawSkillInput>> {
        Ok(self.state.raw_skills.read().await.get(&id).cloned())
    }

    async fn list_unresolved(&self, job_id: Uuid) -> Result<Vec<RawSkillInput>> {
        let mut list: Vec<RawSkillInput> = self
            .state
            .raw_skills
            .read()
            .await
            .values()
            .filter(|r| r.job_id == job_id && r.status == RawSkillStatus::Unresolved)
            .cloned()
            .collect();
        list.sort_by_key(|r| r.created_at);
        Ok(list)
    }

    async fn mark_resolved(&self, id: Uuid, skill_id: Uuid, status: RawSkillStatus) -> Result<()> {
        let mut raw_skills = self.state.raw_skills.write().await;
        let input = raw_skills
            .get_mut(&id)
            .ok_or_else(|| Error::NotFound(format!("raw skill input {}", id)))?;
        input.status = status;
        input.resolved_skill_id = Some(skill_id);
        input.resolved_at = Some(Utc::now());
        Ok(())
    }
}

// =============================================================================
// MASTER DATA
// =============================================================================

#[async_trait]
impl MasterDataRepository for MemoryStore {
    async fn sub_unit_by_name(&self, normalized_name: &str) -> Result<Option<SubUnit>> {
        self.state.master_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .sub_units
            .read()
            .await
            .iter()
            .find(|u| normalize(&u.name) == normalized_name)
            .cloned())
    }

    async fn project_by_name(&self, normalized_name: &str) -> Result<Option<Project>> {
        self.state.master_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .projects
            .read()
            .await
            .iter()
            .find(|p| normalize(&p.name) == normalized_name)
            .cloned())
    }

    async fn team_by_name(&self, normalized_name: &str) -> Result<Option<Team>> {
        self.state.master_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .teams
            .read()
            .await
            .iter()
            .find(|t| normalize(&t.name) == normalized_name)
            .cloned())
    }

    async fn role_by_name(&self, normalized_name: &str) -> Result<Option<Role>> {
        self.state.master_lookups.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .state
            .roles
            .read()
            .await
            .iter()
            .find(|r| normalize(&r.name) == normalized_name)
            .cloned())
    }
}

// =============================================================================
// EMPLOYEES
// =============================================================================

#[async_trait]
impl EmployeeRepository for MemoryStore {
    async fn insert(&self, record: &EmployeeRecord) -> Result<Uuid> {
        self.state
            .employees
            .write()
            .await
            .insert(record.id, record.clone());
        Ok(record.id)
    }

    async fn add_skill(&self, assignment: &SkillAssignment) -> Result<()> {
        let mut assignments = self.state.assignments.write().await;
        let exists = assignments
            .iter()
            .any(|a| a.employee_id == assignment.employee_id && a.skill_id == assignment.skill_id);
        if !exists {
            assignments.push(assignment.clone());
        }
        Ok(())
    }
}
