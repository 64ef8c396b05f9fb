//! Structured logging field name constants for skillmap.
//!
//! All crates use these constants for consistent structured logging fields,
//! so log aggregation tools can query by standardized names across every
//! subsystem.
//!
//! ## Log Level Contract
//!
//! | Level | Usage |
//! |-------|-------|
//! | ERROR | Degraded service, requires operator attention |
//! | WARN  | Recoverable issue, automatic fallback applied |
//! | INFO  | Lifecycle events (job start/finalize), operation completions |
//! | DEBUG | Decision points, cache hits, config choices |
//! | TRACE | Per-row and per-token iteration |

/// Subsystem originating the log event.
/// Values: "import", "resolve", "db", "workbench"
pub const SUBSYSTEM: &str = "subsystem";

/// Component within a subsystem.
/// Examples: "orchestrator", "row_processor", "resolver", "pool"
pub const COMPONENT: &str = "component";

/// Logical operation name.
/// Examples: "resolve", "embed_texts", "validate", "finalize"
pub const OPERATION: &str = "op";

/// Import job UUID being processed.
pub const JOB_ID: &str = "job_id";

/// Skill UUID being operated on.
pub const SKILL_ID: &str = "skill_id";

/// 1-based row number within the source file.
pub const ROW_NUMBER: &str = "row_number";

/// Raw skill token under resolution.
pub const TOKEN: &str = "token";

/// Resolution tier of an outcome ("exact", "alias", "semantic", "unresolved").
pub const TIER: &str = "tier";

/// Similarity score of a semantic hit.
pub const SCORE: &str = "score";

/// Wall-clock duration in milliseconds.
pub const DURATION_MS: &str = "duration_ms";

/// Rows processed so far in a sweep.
pub const PROCESSED: &str = "processed";

/// Rows failed so far in a sweep.
pub const FAILED: &str = "failed";
