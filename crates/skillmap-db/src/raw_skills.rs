//! Raw skill input repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use skillmap_core::{
    new_v7, Error, RawSkillInput, RawSkillRepository, RawSkillStatus, Result,
};

/// PostgreSQL implementation of RawSkillRepository.
pub struct PgRawSkillRepository {
    pool: Pool<Postgres>,
}

impl PgRawSkillRepository {
    /// Create a new PgRawSkillRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Parse a raw skill input row.
    fn parse_input_row(row: sqlx::postgres::PgRow) -> RawSkillInput {
        RawSkillInput {
            id: row.get("id"),
            job_id: row.get("job_id"),
            raw_text: row.get("raw_text"),
            normalized_key: row.get("normalized_key"),
            status: RawSkillStatus::from_str_lossy(row.get("status")),
            resolved_skill_id: row.get("resolved_skill_id"),
            created_at: row.get("created_at"),
            resolved_at: row.get("resolved_at"),
        }
    }
}

#[async_trait]
impl RawSkillRepository for PgRawSkillRepository {
    async fn enqueue(
        &self,
        job_id: Uuid,
        raw_text: &str,
        normalized_key: &str,
        status: RawSkillStatus,
        resolved_skill_id: Option<Uuid>,
    ) -> Result<Uuid> {
        let id = new_v7();
        let resolved_at = resolved_skill_id.map(|_| Utc::now());

        sqlx::query(
            "INSERT INTO raw_skill_input
                 (id, job_id, raw_text, normalized_key, status, resolved_skill_id,
                  created_at, resolved_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(id)
        .bind(job_id)
        .bind(raw_text)
        .bind(normalized_key)
        .bind(status.as_str())
        .bind(resolved_skill_id)
        .bind(Utc::now())
        .bind(resolved_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(id)
    }

    async fn get(&self, id: Uuid) -> Result<Option<RawSkillInput>> {
        let row = sqlx::query(
            "SELECT id, job_id, raw_text, normalized_key, status, resolved_skill_id,
                    created_at, resolved_at
             FROM raw_skill_input WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(row.map(Self::parse_input_row))
    }

    async fn list_unresolved(&self, job_id: Uuid) -> Result<Vec<RawSkillInput>> {
        let rows = sqlx::query(
            "SELECT id, job_id, raw_text, normalized_key, status, resolved_skill_id,
                    created_at, resolved_at
             FROM raw_skill_input
             WHERE job_id = $1 AND status = 'unresolved'
             ORDER BY created_at",
        )
        .bind(job_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(Self::parse_input_row).collect())
    }

    async fn mark_resolved(&self, id: Uuid, skill_id: Uuid, status: RawSkillStatus) -> Result<()> {
        let updated = sqlx::query(
            "UPDATE raw_skill_input
             SET status = $2, resolved_skill_id = $3, resolved_at = $4
             WHERE id = $1",
        )
        .bind(id)
        .bind(status.as_str())
        .bind(skill_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        if updated.rows_affected() == 0 {
            return Err(Error::NotFound(format!("raw skill input {}", id)));
        }
        Ok(())
    }
}
