//! # skillmap-core
//!
//! Core types, traits, and abstractions for the skillmap roster import and
//! skill resolution pipeline.
//!
//! This crate provides the foundational data structures and trait
//! definitions that other skillmap crates depend on.

pub mod defaults;
pub mod error;
pub mod logging;
pub mod models;
pub mod normalize;
pub mod traits;
pub mod uuid_utils;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use uuid::Uuid;
pub use models::*;
pub use normalize::normalize;
pub use traits::*;
pub use uuid_utils::{is_v7, new_v7};
