//! Employee repository implementation.

use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use skillmap_core::{EmployeeRecord, EmployeeRepository, Error, Result, SkillAssignment};

/// PostgreSQL implementation of EmployeeRepository.
pub struct PgEmployeeRepository {
    pool: Pool<Postgres>,
}

impl PgEmployeeRepository {
    /// Create a new PgEmployeeRepository with the given connection pool.
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EmployeeRepository for PgEmployeeRepository {
    async fn insert(&self, record: &EmployeeRecord) -> Result<Uuid> {
        sqlx::query(
            "INSERT INTO employee
                 (id, job_id, external_ref, full_name, email, hired_on, allocation_pct,
                  sub_unit_id, project_id, team_id, role_id, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(record.id)
        .bind(record.job_id)
        .bind(&record.external_ref)
        .bind(&record.full_name)
        .bind(&record.email)
        .bind(record.hired_on)
        .bind(record.allocation_pct)
        .bind(record.sub_unit_id)
        .bind(record.project_id)
        .bind(record.team_id)
        .bind(record.role_id)
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(record.id)
    }

    async fn add_skill(&self, assignment: &SkillAssignment) -> Result<()> {
        sqlx::query(
            "INSERT INTO employee_skill (id, employee_id, skill_id, tier, score)
             VALUES ($1, $2, $3, $4, $5)
             ON CONFLICT (employee_id, skill_id) DO NOTHING",
        )
        .bind(assignment.id)
        .bind(assignment.employee_id)
        .bind(assignment.skill_id)
        .bind(assignment.tier.as_str())
        .bind(assignment.score)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(())
    }
}
