//! Core traits for skillmap abstractions.
//!
//! These traits define the data-store and embedding-provider interfaces that
//! concrete implementations must satisfy, enabling pluggable backends and
//! testability. The pipeline only ever talks to the store through them.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

// =============================================================================
// SKILL REPOSITORY TRAITS
// =============================================================================

/// Repository for canonical skills.
#[async_trait]
pub trait SkillRepository: Send + Sync {
    /// Create a new canonical skill. The implementation derives and stores
    /// the normalized name.
    async fn create(&self, req: CreateSkillRequest) -> Result<Uuid>;

    /// Get a skill by ID.
    async fn get(&self, id: Uuid) -> Result<Option<Skill>>;

    /// Point query by normalized name. Backs the exact-match tier.
    async fn get_by_key(&self, normalized_name: &str) -> Result<Option<Skill>>;

    /// Rename a skill. Content change: the skill's embedding must be marked
    /// stale by the implementation.
    async fn rename(&self, id: Uuid, new_name: &str) -> Result<()>;

    /// List all skills (suggestion hydration, maintenance sweeps).
    async fn list_all(&self) -> Result<Vec<Skill>>;
}

/// Repository for skill aliases. The normalized key is globally unique.
#[async_trait]
pub trait AliasRepository: Send + Sync {
    /// Atomic create-if-absent on the normalized key.
    ///
    /// Returns the alias id; re-creating an alias the same skill already
    /// holds is idempotent and returns the existing id. A key claimed by a
    /// different skill yields [`crate::Error::Conflict`] with no state
    /// change. A successful insert marks the skill's embedding stale.
    async fn create(&self, req: CreateAliasRequest) -> Result<Uuid>;

    /// Point query by normalized key. Backs the alias-match tier.
    async fn get_by_key(&self, normalized_key: &str) -> Result<Option<SkillAlias>>;

    /// All aliases for a skill, for embedding content composition.
    async fn list_for_skill(&self, skill_id: Uuid) -> Result<Vec<SkillAlias>>;

    /// Change an alias's text. Content change: marks the owning skill's
    /// embedding stale. Fails with Conflict if the new key is taken by a
    /// different skill.
    async fn update_text(&self, id: Uuid, new_text: &str) -> Result<()>;

    /// Update the confidence score only. Metadata change: must NOT touch
    /// embedding staleness.
    async fn set_confidence(&self, id: Uuid, confidence: Option<f32>) -> Result<()>;

    /// Delete an alias. Content change: marks the owning skill's embedding
    /// stale.
    async fn delete(&self, id: Uuid) -> Result<()>;
}

// =============================================================================
// EMBEDDING REPOSITORY TRAITS
// =============================================================================

/// Repository for per-skill embeddings and similarity search.
#[async_trait]
pub trait SkillEmbeddingRepository: Send + Sync {
    /// Store (or replace) the vector for a skill, clearing staleness.
    async fn upsert(&self, skill_id: Uuid, vector: Vector, model: &str) -> Result<()>;

    /// Mark a skill's embedding stale without touching the vector.
    async fn mark_stale(&self, skill_id: Uuid) -> Result<()>;

    /// Get the embedding record for a skill.
    async fn get(&self, skill_id: Uuid) -> Result<Option<SkillEmbedding>>;

    /// Skill ids whose embeddings are currently stale.
    async fn list_stale(&self) -> Result<Vec<Uuid>>;

    /// Nearest-neighbor search over non-stale embeddings, best first.
    async fn find_similar(&self, query: &Vector, top_k: i64) -> Result<Vec<SkillHit>>;
}

// =============================================================================
// IMPORT JOB REPOSITORY TRAITS
// =============================================================================

/// Repository for import job lifecycle and progress checkpoints.
#[async_trait]
pub trait ImportJobRepository: Send + Sync {
    /// Create a job in `Pending` with the given row count.
    async fn create(&self, source_name: &str, total_rows: i64) -> Result<ImportJob>;

    /// Transition the job to `Running`.
    async fn mark_running(&self, job_id: Uuid) -> Result<()>;

    /// Persist a throttled progress checkpoint.
    async fn update_progress(&self, job_id: Uuid, progress: &JobProgress) -> Result<()>;

    /// Persist the terminal state with final counts. Always unthrottled.
    async fn finalize(
        &self,
        job_id: Uuid,
        status: ImportStatus,
        progress: &JobProgress,
        failure_reason: Option<&str>,
    ) -> Result<()>;

    /// Get a job by ID.
    async fn get(&self, job_id: Uuid) -> Result<Option<ImportJob>>;
}

// =============================================================================
// RAW SKILL INPUT REPOSITORY TRAITS
// =============================================================================

/// Repository for raw skill tokens captured during import.
#[async_trait]
pub trait RawSkillRepository: Send + Sync {
    /// Record a token for a job with its resolution status.
    async fn enqueue(
        &self,
        job_id: Uuid,
        raw_text: &str,
        normalized_key: &str,
        status: RawSkillStatus,
        resolved_skill_id: Option<Uuid>,
    ) -> Result<Uuid>;

    /// Get one raw input by ID.
    async fn get(&self, id: Uuid) -> Result<Option<RawSkillInput>>;

    /// Unresolved inputs for a job, oldest first.
    async fn list_unresolved(&self, job_id: Uuid) -> Result<Vec<RawSkillInput>>;

    /// Mark an input resolved to a skill with the given status.
    async fn mark_resolved(&self, id: Uuid, skill_id: Uuid, status: RawSkillStatus) -> Result<()>;
}

// =============================================================================
// MASTER DATA REPOSITORY TRAITS
// =============================================================================

/// Read-only point lookups over the organizational hierarchy. All lookups
/// take normalized names; rows carry their parent ids so containment checks
/// need no extra queries.
#[async_trait]
pub trait MasterDataRepository: Send + Sync {
    async fn sub_unit_by_name(&self, normalized_name: &str) -> Result<Option<SubUnit>>;

    async fn project_by_name(&self, normalized_name: &str) -> Result<Option<Project>>;

    async fn team_by_name(&self, normalized_name: &str) -> Result<Option<Team>>;

    async fn role_by_name(&self, normalized_name: &str) -> Result<Option<Role>>;
}

// =============================================================================
// EMPLOYEE REPOSITORY TRAITS
// =============================================================================

/// Repository for validated employee records and their skill assignments.
#[async_trait]
pub trait EmployeeRepository: Send + Sync {
    /// Persist an employee record.
    async fn insert(&self, record: &EmployeeRecord) -> Result<Uuid>;

    /// Persist one employee/skill association.
    async fn add_skill(&self, assignment: &SkillAssignment) -> Result<()>;
}

// =============================================================================
// INFERENCE TRAITS
// =============================================================================

/// Backend for generating text embeddings.
///
/// May be a remote service; callers bound every call with a timeout and
/// degrade to an unresolved outcome on failure.
#[async_trait]
pub trait EmbeddingBackend: Send + Sync {
    /// Generate embeddings for the given texts.
    ///
    /// Returns a vector of embedding vectors, one per input text.
    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vector>>;

    /// Get the expected dimension of embedding vectors.
    fn dimension(&self) -> usize;

    /// Get the model name being used.
    fn model_name(&self) -> &str;
}
