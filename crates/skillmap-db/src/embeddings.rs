//! Skill embedding repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use pgvector::Vector;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use skillmap_core::{Error, Result, SkillEmbedding, SkillEmbeddingRepository, SkillHit};

/// PostgreSQL + pgvector implementation of SkillEmbeddingRepository.
pub struct PgSkillEmbeddingRepository {
    pool: Pool<Postgres>,
}

impl PgSkillEmbeddingRepository {
    /// Create a new PgSkillEmbeddingRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl SkillEmbeddingRepository for PgSkillEmbeddingRepository {
    async fn upsert(&self, skill_id: Uuid, vector: Vector, model: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO skill_embedding (skill_id, vector, model, stale, updated_at)
             VALUES ($1, $2, $3, FALSE, $4)
             ON CONFLICT (skill_id)
             DO UPDATE SET vector = $2, model = $3, stale = FALSE, updated_at = $4",
        )
        .bind(skill_id)
        .bind(vector)
        .bind(model)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(())
    }

    async fn mark_stale(&self, skill_id: Uuid) -> Result<()> {
        sqlx::query("UPDATE skill_embedding SET stale = TRUE WHERE skill_id = $1")
            .bind(skill_id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;
        Ok(())
    }

    async fn get(&self, skill_id: Uuid) -> Result<Option<SkillEmbedding>> {
        let row = sqlx::query(
            "SELECT skill_id, vector, model, stale, updated_at
             FROM skill_embedding WHERE skill_id = $1",
        )
        .bind(skill_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(|row| SkillEmbedding {
            skill_id: row.get("skill_id"),
            vector: row.get("vector"),
            model: row.get("model"),
            stale: row.get("stale"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn list_stale(&self) -> Result<Vec<Uuid>> {
        let rows = sqlx::query("SELECT skill_id FROM skill_embedding WHERE stale IS TRUE")
            .fetch_all(&self.pool)
            .await
            .map_err(Error::Database)?;

        Ok(rows.into_iter().map(|row| row.get("skill_id")).collect())
    }

    async fn find_similar(&self, query: &Vector, top_k: i64) -> Result<Vec<SkillHit>> {
        // Stale vectors are excluded until regenerated; cosine distance
        // converted to a similarity score in [0, 1].
        let rows = sqlx::query(
            "SELECT skill_id, 1.0 - (vector <=> $1::vector) AS score
             FROM skill_embedding
             WHERE stale IS FALSE
             ORDER BY vector <=> $1::vector
             LIMIT $2",
        )
        .bind(query)
        .bind(top_k)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows
            .into_iter()
            .map(|row| SkillHit {
                skill_id: row.get("skill_id"),
                score: row.get::<f64, _>("score") as f32,
            })
            .collect())
    }
}
