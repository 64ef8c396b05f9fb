//! Skill repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use skillmap_core::{
    new_v7, normalize, CreateSkillRequest, Error, Result, Skill, SkillRepository,
};

/// PostgreSQL implementation of SkillRepository.
pub struct PgSkillRepository {
    pool: Pool<Postgres>,
}

impl PgSkillRepository {
    /// Create a new PgSkillRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a skill row into a Skill struct.
    fn parse_skill_row(row: sqlx::postgres::PgRow) -> Skill {
        Skill {
            id: row.get("id"),
            subcategory_id: row.get("subcategory_id"),
            name: row.get("name"),
            normalized_name: row.get("normalized_name"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }
}

#[async_trait]
impl SkillRepository for PgSkillRepository {
    async fn create(&self, req: CreateSkillRequest) -> Result<Uuid> {
        let id = new_v7();
        let key = normalize(&req.name);
        if key.is_empty() {
            return Err(Error::InvalidInput("skill name is empty".into()));
        }

        sqlx::query(
            "INSERT INTO skill (id, subcategory_id, name, normalized_name, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $5)",
        )
        .bind(id)
        .bind(req.subcategory_id)
        .bind(&req.name)
        .bind(&key)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<Skill>> {
        let row = sqlx::query(
            "SELECT id, subcategory_id, name, normalized_name, created_at, updated_at
             FROM skill WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_skill_row))
    }

    async fn get_by_key(&self, normalized_name: &str) -> Result<Option<Skill>> {
        let row = sqlx::query(
            "SELECT id, subcategory_id, name, normalized_name, created_at, updated_at
             FROM skill WHERE normalized_name = $1",
        )
        .bind(normalized_name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_skill_row))
    }

    async fn rename(&self, id: Uuid, new_name: &str) -> Result<()> {
        let key = normalize(new_name);
        if key.is_empty() {
            return Err(Error::InvalidInput("skill name is empty".into()));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let updated = sqlx::query(
            "UPDATE skill SET name = $2, normalized_name = $3, updated_at = $4 WHERE id = $1",
        )
        .bind(id)
        .bind(new_name)
        .bind(&key)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::SkillNotFound(id));
        }

        // Content change: the embedding can no longer be trusted for search.
        sqlx::query("UPDATE skill_embedding SET stale = TRUE WHERE skill_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Skill>> {
        let rows = sqlx::query(
            "SELECT id, subcategory_id, name, normalized_name, created_at, updated_at
             FROM skill ORDER BY normalized_name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_skill_row).collect())
    }
}
