//! # skillmap-resolve
//!
//! Skill name resolution for skillmap.
//!
//! This crate provides:
//! - The tiered token resolver (exact, alias, semantic)
//! - Embedding regeneration for skills whose content changed
//! - The human resolution workbench over unresolved tokens
//! - Embedding backends: Ollama for production, a mock for tests

pub mod maintenance;
pub mod mock;
pub mod ollama;
pub mod resolver;
pub mod workbench;

pub use maintenance::EmbeddingMaintainer;
pub use mock::MockEmbeddingBackend;
pub use ollama::{OllamaBackend, DEFAULT_OLLAMA_URL};
pub use resolver::{ResolverConfig, SkillResolver};
pub use workbench::{ResolutionWorkbench, WorkbenchItem};

// Re-export core types
pub use skillmap_core::*;
