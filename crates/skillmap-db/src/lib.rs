//! # skillmap-db
//!
//! PostgreSQL database layer for skillmap.
//!
//! This crate provides:
//! - Connection pool management
//! - Repository implementations for all core entities
//! - Vector similarity search with pgvector
//! - An in-memory store for integration tests without PostgreSQL
//!
//! ## Example
//!
//! ```rust,ignore
//! use skillmap_db::{Database, CreateSkillRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/skillmap").await?;
//!
//!     let skill_id = db.skills.create(CreateSkillRequest {
//!         subcategory_id: subcat,
//!         name: "Rust".to_string(),
//!     }).await?;
//!
//!     println!("Created skill: {}", skill_id);
//!     Ok(())
//! }
//! ```
pub mod aliases;
pub mod embeddings;
pub mod employees;
pub mod import_jobs;
pub mod master_data;
pub mod memory;
pub mod pool;
pub mod raw_skills;
pub mod skills;

// Re-export core types
pub use skillmap_core::*;

pub use aliases::PgAliasRepository;
pub use embeddings::PgSkillEmbeddingRepository;
pub use employees::PgEmployeeRepository;
pub use import_jobs::PgImportJobRepository;
pub use master_data::PgMasterDataRepository;
pub use memory::MemoryStore;
pub use pool::{create_pool, create_pool_with_config, PoolConfig};
pub use raw_skills::PgRawSkillRepository;
pub use skills::PgSkillRepository;

/// Combined database context with all repositories.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Canonical skill repository.
    pub skills: PgSkillRepository,
    /// Alias repository for reconciliation shortcuts.
    pub aliases: PgAliasRepository,
    /// Skill embedding repository for semantic matching.
    pub embeddings: PgSkillEmbeddingRepository,
    /// Import job repository for progress tracking.
    pub jobs: PgImportJobRepository,
    /// Raw skill input queue for the resolution workbench.
    pub raw_skills: PgRawSkillRepository,
    /// Organizational master data lookups.
    pub master_data: PgMasterDataRepository,
    /// Employee and skill assignment repository.
    pub employees: PgEmployeeRepository,
}

impl Database {
    /// Create a new Database instance from a connection pool.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self {
            skills: PgSkillRepository::new(pool.clone()),
            aliases: PgAliasRepository::new(pool.clone()),
            embeddings: PgSkillEmbeddingRepository::new(pool.clone()),
            jobs: PgImportJobRepository::new(pool.clone()),
            raw_skills: PgRawSkillRepository::new(pool.clone()),
            master_data: PgMasterDataRepository::new(pool.clone()),
            employees: PgEmployeeRepository::new(pool.clone()),
            pool,
        }
    }

    /// Create a new Database instance by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Create with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self::new(self.pool.clone())
    }
}
