//! Core data model for the roster import and skill resolution pipeline.

use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// IMPORT JOB TYPES
// =============================================================================

/// Terminal and in-flight states of an import job.
///
/// `Failed` is reserved for catastrophic conditions (unparsable source file,
/// unreachable store). Row-local failures never force it; a job where every
/// row failed for row-local reasons still finalizes as `PartialSuccess`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImportStatus {
    Pending,
    Running,
    Completed,
    PartialSuccess,
    Failed,
}

impl ImportStatus {
    /// Stable wire/database string for this status.
    pub fn as_str(&self) -> &'static str {
        match self {
            ImportStatus::Pending => "pending",
            ImportStatus::Running => "running",
            ImportStatus::Completed => "completed",
            ImportStatus::PartialSuccess => "partial_success",
            ImportStatus::Failed => "failed",
        }
    }

    /// Parse a database string back into a status. Unknown strings map to
    /// `Pending` so a corrupted row degrades to a restartable state.
    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "running" => ImportStatus::Running,
            "completed" => ImportStatus::Completed,
            "partial_success" => ImportStatus::PartialSuccess,
            "failed" => ImportStatus::Failed,
            _ => ImportStatus::Pending,
        }
    }

    /// Whether this status is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ImportStatus::Completed | ImportStatus::PartialSuccess | ImportStatus::Failed
        )
    }
}

/// One bulk roster upload. Owned and mutated only by the orchestrator;
/// retained after completion for audit and status polling.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportJob {
    pub id: Uuid,
    pub status: ImportStatus,
    /// Name of the uploaded source file, for operator-facing reporting.
    pub source_name: String,
    pub total_rows: i64,
    pub processed_rows: i64,
    pub succeeded_rows: i64,
    pub failed_rows: i64,
    /// Error-code -> occurrence count across all failed rows.
    pub error_summary: HashMap<String, i64>,
    /// Set only when the job finalized as `Failed`.
    pub failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// When progress counts were last durably persisted.
    pub progress_persisted_at: Option<DateTime<Utc>>,
}

/// Monotone progress snapshot persisted by the throttled checkpoint writer.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobProgress {
    pub processed: i64,
    pub succeeded: i64,
    pub failed: i64,
    pub error_summary: HashMap<String, i64>,
}

/// Poller-facing view of a job, derived from the last persisted checkpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobStatusView {
    pub job_id: Uuid,
    pub status: ImportStatus,
    pub source_name: String,
    pub total_rows: i64,
    pub processed_rows: i64,
    pub succeeded_rows: i64,
    pub failed_rows: i64,
    pub error_summary: HashMap<String, i64>,
    pub failure_reason: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<ImportJob> for JobStatusView {
    fn from(job: ImportJob) -> Self {
        JobStatusView {
            job_id: job.id,
            status: job.status,
            source_name: job.source_name,
            total_rows: job.total_rows,
            processed_rows: job.processed_rows,
            succeeded_rows: job.succeeded_rows,
            failed_rows: job.failed_rows,
            error_summary: job.error_summary,
            failure_reason: job.failure_reason,
            updated_at: job.updated_at,
        }
    }
}

// =============================================================================
// ROW ERRORS
// =============================================================================

/// Stable row-local error codes surfaced in the job's error summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowErrorCode {
    SubUnitNotFound,
    ProjectNotFound,
    TeamNotFound,
    RoleNotFound,
    HierarchyMismatch,
    MalformedDate,
    MalformedNumber,
    DuplicateInFile,
    MissingField,
    PersistFailed,
}

impl RowErrorCode {
    /// Stable wire string for this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            RowErrorCode::SubUnitNotFound => "sub_unit_not_found",
            RowErrorCode::ProjectNotFound => "project_not_found",
            RowErrorCode::TeamNotFound => "team_not_found",
            RowErrorCode::RoleNotFound => "role_not_found",
            RowErrorCode::HierarchyMismatch => "hierarchy_mismatch",
            RowErrorCode::MalformedDate => "malformed_date",
            RowErrorCode::MalformedNumber => "malformed_number",
            RowErrorCode::DuplicateInFile => "duplicate_in_file",
            RowErrorCode::MissingField => "missing_field",
            RowErrorCode::PersistFailed => "persist_failed",
        }
    }
}

impl std::fmt::Display for RowErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A business-rule failure recorded against one row. Not an [`crate::Error`]:
/// it never aborts the sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RowError {
    pub code: RowErrorCode,
    pub message: String,
}

impl RowError {
    pub fn new(code: RowErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

/// Outcome of processing one import row.
#[derive(Debug, Clone)]
pub struct RowOutcome {
    /// 1-based row number in file order.
    pub row_number: i64,
    pub employee_id: Option<Uuid>,
    pub error: Option<RowError>,
    /// Tokens resolved to a canonical skill on this row.
    pub resolved_skills: usize,
    /// Tokens enqueued for workbench triage.
    pub unresolved_tokens: usize,
}

impl RowOutcome {
    /// Whether the row was persisted successfully.
    pub fn succeeded(&self) -> bool {
        self.error.is_none()
    }
}

// =============================================================================
// SKILL TAXONOMY TYPES
// =============================================================================

/// Top level of the strict 3-level skill taxonomy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillCategory {
    pub id: Uuid,
    pub name: String,
}

/// Middle level; every skill belongs to exactly one subcategory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSubcategory {
    pub id: Uuid,
    pub category_id: Uuid,
    pub name: String,
}

/// A canonical skill. Name uniqueness is scoped within its subcategory;
/// the normalized name is the key exact matching runs against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Skill {
    pub id: Uuid,
    pub subcategory_id: Uuid,
    pub name: String,
    pub normalized_name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request for creating a new canonical skill.
#[derive(Debug, Clone)]
pub struct CreateSkillRequest {
    pub subcategory_id: Uuid,
    pub name: String,
}

/// Provenance of a skill alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AliasSource {
    /// Loaded with the curated taxonomy.
    Seed,
    /// Created automatically by the resolver.
    Auto,
    /// Confirmed by a human through the workbench.
    Human,
}

impl AliasSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            AliasSource::Seed => "seed",
            AliasSource::Auto => "auto",
            AliasSource::Human => "human",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "seed" => AliasSource::Seed,
            "human" => AliasSource::Human,
            _ => AliasSource::Auto,
        }
    }
}

/// An alternate spelling that maps directly to a canonical skill.
/// The normalized key is globally unique: two skills cannot claim the same
/// alias text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAlias {
    pub id: Uuid,
    pub skill_id: Uuid,
    pub alias_text: String,
    pub normalized_key: String,
    pub source: AliasSource,
    pub confidence: Option<f32>,
    pub created_at: DateTime<Utc>,
}

/// Request for creating a new alias.
#[derive(Debug, Clone)]
pub struct CreateAliasRequest {
    pub skill_id: Uuid,
    pub alias_text: String,
    pub source: AliasSource,
    pub confidence: Option<f32>,
}

// =============================================================================
// EMBEDDING TYPES
// =============================================================================

/// Embedding vector type (re-exported from pgvector).
pub use pgvector::Vector;

/// The semantic vector for one skill: its name plus its current alias set.
///
/// A content change to the name or any alias text marks this stale; stale
/// vectors are excluded from similarity search until regenerated.
#[derive(Debug, Clone)]
pub struct SkillEmbedding {
    pub skill_id: Uuid,
    pub vector: Vector,
    /// Model/version tag the vector was generated with.
    pub model: String,
    pub stale: bool,
    pub updated_at: DateTime<Utc>,
}

/// One nearest-neighbor hit from similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkillHit {
    pub skill_id: Uuid,
    pub score: f32,
}

/// A suggested canonical skill for an unresolved token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillSuggestion {
    pub skill_id: Uuid,
    pub name: String,
    pub score: f32,
}

// =============================================================================
// RESOLUTION TYPES
// =============================================================================

/// The tier a token resolved through, in strict precedence order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResolutionTier {
    Exact,
    Alias,
    Semantic,
    Unresolved,
}

impl ResolutionTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResolutionTier::Exact => "exact",
            ResolutionTier::Alias => "alias",
            ResolutionTier::Semantic => "semantic",
            ResolutionTier::Unresolved => "unresolved",
        }
    }
}

/// Outcome of resolving one raw token.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub tier: ResolutionTier,
    pub skill_id: Option<Uuid>,
    /// Similarity score; present for semantic matches only.
    pub score: Option<f32>,
    /// Top-K candidates captured for downstream suggestion UI.
    pub candidates: Vec<SkillSuggestion>,
}

impl Resolution {
    /// An unresolved outcome with no candidates.
    pub fn unresolved() -> Self {
        Resolution {
            tier: ResolutionTier::Unresolved,
            skill_id: None,
            score: None,
            candidates: Vec::new(),
        }
    }

    /// Whether the token resolved to a canonical skill.
    pub fn is_resolved(&self) -> bool {
        self.skill_id.is_some()
    }
}

// =============================================================================
// RAW SKILL INPUT TYPES
// =============================================================================

/// Resolution status of a raw skill token captured during import.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RawSkillStatus {
    Unresolved,
    ExactMatched,
    AliasMatched,
    /// Accepted automatically via semantic similarity.
    AutoMatched,
    /// Mapped by a human through the workbench.
    HumanResolved,
}

impl RawSkillStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RawSkillStatus::Unresolved => "unresolved",
            RawSkillStatus::ExactMatched => "exact_matched",
            RawSkillStatus::AliasMatched => "alias_matched",
            RawSkillStatus::AutoMatched => "auto_matched",
            RawSkillStatus::HumanResolved => "human_resolved",
        }
    }

    pub fn from_str_lossy(s: &str) -> Self {
        match s {
            "exact_matched" => RawSkillStatus::ExactMatched,
            "alias_matched" => RawSkillStatus::AliasMatched,
            "auto_matched" => RawSkillStatus::AutoMatched,
            "human_resolved" => RawSkillStatus::HumanResolved,
            _ => RawSkillStatus::Unresolved,
        }
    }
}

/// A verbatim skill token tied to the job it arrived in. Created during row
/// processing; mutated later when the workbench resolves it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSkillInput {
    pub id: Uuid,
    pub job_id: Uuid,
    pub raw_text: String,
    pub normalized_key: String,
    pub status: RawSkillStatus,
    pub resolved_skill_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub resolved_at: Option<DateTime<Utc>>,
}

// =============================================================================
// MASTER DATA TYPES
// =============================================================================

/// Organizational sub-unit (read-only reference data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubUnit {
    pub id: Uuid,
    pub name: String,
}

/// Project; must belong to the sub-unit a row declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub sub_unit_id: Uuid,
    pub name: String,
}

/// Team; must belong to the project a row declares.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub project_id: Uuid,
    pub name: String,
}

/// Employee role (read-only reference data).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: Uuid,
    pub name: String,
}

/// The organizational context one row declares, by name.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowContext {
    pub sub_unit: String,
    pub project: String,
    pub team: String,
    pub role: String,
}

/// Master data ids resolved from a valid row context.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedContext {
    pub sub_unit_id: Uuid,
    pub project_id: Uuid,
    pub team_id: Uuid,
    pub role_id: Uuid,
}

/// Result of hierarchical master-data validation for one row.
#[derive(Debug, Clone)]
pub enum ValidationResult {
    Valid(ResolvedContext),
    Invalid(RowError),
}

// =============================================================================
// EMPLOYEE TYPES
// =============================================================================

/// A validated employee record produced from one import row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmployeeRecord {
    pub id: Uuid,
    /// The import job that created this record.
    pub job_id: Uuid,
    /// Employee reference from the source file; duplicate-within-file key.
    pub external_ref: String,
    pub full_name: String,
    pub email: Option<String>,
    pub hired_on: Option<NaiveDate>,
    /// Declared allocation percentage, 0..=100.
    pub allocation_pct: Option<f32>,
    pub sub_unit_id: Uuid,
    pub project_id: Uuid,
    pub team_id: Uuid,
    pub role_id: Uuid,
    pub created_at: DateTime<Utc>,
}

/// An employee/skill association with the resolution that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkillAssignment {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub skill_id: Uuid,
    pub tier: ResolutionTier,
    /// Similarity score for semantic matches.
    pub score: Option<f32>,
}
