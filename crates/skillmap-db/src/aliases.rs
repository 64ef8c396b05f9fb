//! Skill alias repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use skillmap_core::{
    new_v7, normalize, AliasRepository, AliasSource, CreateAliasRequest, Error, Result, SkillAlias,
};

/// PostgreSQL implementation of AliasRepository.
///
/// The `skill_alias.normalized_key` UNIQUE constraint is the write-level
/// backstop for alias uniqueness across concurrent resolutions.
pub struct PgAliasRepository {
    pool: Pool<Postgres>,
}

impl PgAliasRepository {
    /// Create a new PgAliasRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse an alias row into a SkillAlias struct.
    fn parse_alias_row(row: sqlx::postgres::PgRow) -> SkillAlias {
        SkillAlias {
            id: row.get("id"),
            skill_id: row.get("skill_id"),
            alias_text: row.get("alias_text"),
            normalized_key: row.get("normalized_key"),
            source: AliasSource::from_str_lossy(row.get("source")),
            confidence: row.get("confidence"),
            created_at: row.get("created_at"),
        }
    }
}

#[async_trait]
impl AliasRepository for PgAliasRepository {
    async fn create(&self, req: CreateAliasRequest) -> Result<Uuid> {
        let key = normalize(&req.alias_text);
        if key.is_empty() {
            return Err(Error::InvalidInput("alias text is empty".into()));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let id = new_v7();
        let inserted: Option<Uuid> = sqlx::query_scalar(
            "INSERT INTO skill_alias
                 (id, skill_id, alias_text, normalized_key, source, confidence, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             ON CONFLICT (normalized_key) DO NOTHING
             RETURNING id",
        )
        .bind(id)
        .bind(req.skill_id)
        .bind(&req.alias_text)
        .bind(&key)
        .bind(req.source.as_str())
        .bind(req.confidence)
        .bind(Utc::now())
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        let alias_id = match inserted {
            Some(id) => {
                // Content change to the alias set: invalidate the embedding.
                sqlx::query("UPDATE skill_embedding SET stale = TRUE WHERE skill_id = $1")
                    .bind(req.skill_id)
                    .execute(&mut *tx)
                    .await
                    .map_err(Error::Database)?;
                id
            }
            None => {
                let existing = sqlx::query(
                    "SELECT id, skill_id FROM skill_alias WHERE normalized_key = $1",
                )
                .bind(&key)
                .fetch_one(&mut *tx)
                .await
                .map_err(Error::Database)?;

                let existing_skill: Uuid = existing.get("skill_id");
                if existing_skill != req.skill_id {
                    return Err(Error::Conflict(format!(
                        "alias '{}' already belongs to skill {}",
                        req.alias_text, existing_skill
                    )));
                }
                // Same skill re-creating its own alias is idempotent.
                existing.get("id")
            }
        };

        tx.commit().await.map_err(Error::Database)?;
        Ok(alias_id)
    }

    async fn get_by_key(&self, normalized_key: &str) -> Result<Option<SkillAlias>> {
        let row = sqlx::query(
            "SELECT id, skill_id, alias_text, normalized_key, source, confidence, created_at
             FROM skill_alias WHERE normalized_key = $1",
        )
        .bind(normalized_key)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_alias_row))
    }

    async fn list_for_skill(&self, skill_id: Uuid) -> Result<Vec<SkillAlias>> {
        let rows = sqlx::query(
            "SELECT id, skill_id, alias_text, normalized_key, source, confidence, created_at
             FROM skill_alias WHERE skill_id = $1 ORDER BY normalized_key",
        )
        .bind(skill_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_alias_row).collect())
    }

    async fn update_text(&self, id: Uuid, new_text: &str) -> Result<()> {
        let key = normalize(new_text);
        if key.is_empty() {
            return Err(Error::InvalidInput("alias text is empty".into()));
        }

        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let alias = sqlx::query("SELECT skill_id FROM skill_alias WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("alias {}", id)))?;
        let skill_id: Uuid = alias.get("skill_id");

        let claimed = sqlx::query(
            "SELECT skill_id FROM skill_alias WHERE normalized_key = $1 AND id <> $2",
        )
        .bind(&key)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(Error::Database)?;

        if let Some(row) = claimed {
            let other: Uuid = row.get("skill_id");
            return Err(Error::Conflict(format!(
                "alias '{}' already belongs to skill {}",
                new_text, other
            )));
        }

        sqlx::query("UPDATE skill_alias SET alias_text = $2, normalized_key = $3 WHERE id = $1")
            .bind(id)
            .bind(new_text)
            .bind(&key)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        sqlx::query("UPDATE skill_embedding SET stale = TRUE WHERE skill_id = $1")
            .bind(skill_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }

    async fn set_confidence(&self, id: Uuid, confidence: Option<f32>) -> Result<()> {
        // Metadata-only change: never touches embedding staleness.
        let updated = sqlx::query("UPDATE skill_alias SET confidence = $2 WHERE id = $1")
            .bind(id)
            .bind(confidence)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("alias {}", id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut tx = self.pool.begin().await.map_err(Error::Database)?;

        let row = sqlx::query("DELETE FROM skill_alias WHERE id = $1 RETURNING skill_id")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(Error::Database)?
            .ok_or_else(|| Error::NotFound(format!("alias {}", id)))?;
        let skill_id: Uuid = row.get("skill_id");

        sqlx::query("UPDATE skill_embedding SET stale = TRUE WHERE skill_id = $1")
            .bind(skill_id)
            .execute(&mut *tx)
            .await
            .map_err(Error::Database)?;

        tx.commit().await.map_err(Error::Database)?;
        Ok(())
    }
}
