//! Centralized default constants for the skillmap system.
//!
//! **This module is the single source of truth** for all shared default
//! values. Crates reference these constants instead of defining their own
//! magic numbers. Deployment-facing values (threshold, top-K) are only
//! fallbacks; the env-driven configs override them.

// =============================================================================
// SEMANTIC RESOLUTION
// =============================================================================

/// Minimum similarity score for an automatic semantic match.
pub const ACCEPT_THRESHOLD: f32 = 0.80;

/// Number of nearest-neighbor candidates captured per token.
pub const SUGGEST_TOP_K: i64 = 5;

/// Default embedding model name (Ollama).
pub const EMBED_MODEL: &str = "nomic-embed-text";

/// Default embedding vector dimension for nomic-embed-text.
pub const EMBED_DIMENSION: usize = 768;

/// Bounded timeout for one embedding-provider call, in seconds.
pub const EMBED_TIMEOUT_SECS: u64 = 10;

// =============================================================================
// IMPORT PROGRESS
// =============================================================================

/// Persist progress at most every this many processed rows.
pub const PROGRESS_EVERY_ROWS: i64 = 50;

/// ...or every this many elapsed seconds, whichever comes first.
pub const PROGRESS_EVERY_SECS: u64 = 2;

// =============================================================================
// DATABASE POOL
// =============================================================================

/// Maximum number of connections in the pool.
pub const POOL_MAX_CONNECTIONS: u32 = 10;

/// Connection acquire timeout in seconds.
pub const POOL_CONNECT_TIMEOUT_SECS: u64 = 30;

/// Idle connection timeout in seconds.
pub const POOL_IDLE_TIMEOUT_SECS: u64 = 600;
