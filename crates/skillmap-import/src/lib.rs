//! # skillmap-import
//!
//! Bulk roster import for skillmap.
//!
//! This crate provides:
//! - CSV roster parsing and field sanitization
//! - Hierarchical master-data validation with per-job memoization
//! - The per-row pipeline wiring sanitization, validation, and resolution
//! - The job orchestrator with throttled persisted progress
//! - The poller-facing job status reader

pub mod orchestrator;
pub mod progress;
pub mod reader;
pub mod row;
pub mod sanitize;
pub mod status;
pub mod validator;

pub use orchestrator::{ImportOrchestrator, OrchestratorConfig};
pub use progress::ProgressGate;
pub use reader::{parse_roster, ImportRow};
pub use row::RowProcessor;
pub use sanitize::{
    parse_allocation, parse_date, sanitize_fields, split_skill_tokens, SanitizedFields,
    DATE_FORMATS,
};
pub use status::JobStatusReader;
pub use validator::MasterDataValidator;

// Re-export core types
pub use skillmap_core::*;
