//! Master data repository implementation.
//!
//! The organizational hierarchy is read-only reference data; the pipeline
//! only performs point lookups by normalized name.

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Row};

use skillmap_core::{Error, MasterDataRepository, Project, Result, Role, SubUnit, Team};

/// PostgreSQL implementation of MasterDataRepository.
pub struct PgMasterDataRepository {
    pool: Pool<Postgres>,
}

impl PgMasterDataRepository {
    /// Create a new PgMasterDataRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl MasterDataRepository for PgMasterDataRepository {
    async fn sub_unit_by_name(&self, normalized_name: &str) -> Result<Option<SubUnit>> {
        let row = sqlx::query("SELECT id, name FROM sub_unit WHERE normalized_name = $1")
            .bind(normalized_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|row| SubUnit {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }

    async fn project_by_name(&self, normalized_name: &str) -> Result<Option<Project>> {
        let row = sqlx::query(
            "SELECT id, sub_unit_id, name FROM project WHERE normalized_name = $1",
        )
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| Project {
            id: row.get("id"),
            sub_unit_id: row.get("sub_unit_id"),
            name: row.get("name"),
        }))
    }

    async fn team_by_name(&self, normalized_name: &str) -> Result<Option<Team>> {
        let row = sqlx::query("SELECT id, project_id, name FROM team WHERE normalized_name = $1")
            .bind(normalized_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|row| Team {
            id: row.get("id"),
            project_id: row.get("project_id"),
            name: row.get("name"),
        }))
    }

    async fn role_by_name(&self, normalized_name: &str) -> Result<Option<Role>> {
        let row = sqlx::query("SELECT id, name FROM role WHERE normalized_name = $1")
            .bind(normalized_name)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(row.map(|row| Role {
            id: row.get("id"),
            name: row.get("name"),
        }))
    }
}
