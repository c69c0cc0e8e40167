//! PostgreSQL-backed grievance repository.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redressa_application::{GrievanceRepository, StatusUpdate};
use redressa_core::{AppError, AppResult};
use redressa_domain::{Grievance, GrievanceId, GrievanceStatus};
use sqlx::PgPool;

/// PostgreSQL implementation of the grievance repository port.
#[derive(Clone)]
pub struct PostgresGrievanceRepository {
    pool: PgPool,
}

impl PostgresGrievanceRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct GrievanceRow {
    id: uuid::Uuid,
    user_id: String,
    title: String,
    description: String,
    status: String,
    file_urls: Vec<String>,
    submitted_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
    version: i64,
}

impl TryFrom<GrievanceRow> for Grievance {
    type Error = AppError;

    fn try_from(row: GrievanceRow) -> Result<Self, Self::Error> {
        // A stored status outside the enum is corruption, not something to
        // clamp into range.
        let status = GrievanceStatus::from_str(row.status.as_str())?;

        Grievance::from_stored(
            GrievanceId::from_uuid(row.id),
            row.user_id,
            row.title,
            row.description,
            status,
            row.file_urls,
            row.submitted_at,
            row.last_updated,
            row.version,
        )
    }
}

#[async_trait]
impl GrievanceRepository for PostgresGrievanceRepository {
    async fn create(&self, grievance: Grievance) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO grievances
                (id, user_id, title, description, status, file_urls, submitted_at, last_updated, version)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(grievance.id().as_uuid())
        .bind(grievance.user_id())
        .bind(grievance.title().as_str())
        .bind(grievance.description().as_str())
        .bind(grievance.status().as_str())
        .bind(grievance.file_urls().to_vec())
        .bind(grievance.submitted_at())
        .bind(grievance.last_updated())
        .bind(grievance.version())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to create grievance: {error}")))?;

        Ok(())
    }

    async fn find_by_id(&self, id: GrievanceId) -> AppResult<Option<Grievance>> {
        let row = sqlx::query_as::<_, GrievanceRow>(
            r#"
            SELECT id, user_id, title, description, status, file_urls,
                   submitted_at, last_updated, version
            FROM grievances
            WHERE id = $1
            "#,
        )
        .bind(id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to load grievance: {error}")))?;

        row.map(Grievance::try_from).transpose()
    }

    async fn list_owned_by(&self, subject: &str) -> AppResult<Vec<Grievance>> {
        let rows = sqlx::query_as::<_, GrievanceRow>(
            r#"
            SELECT id, user_id, title, description, status, file_urls,
                   submitted_at, last_updated, version
            FROM grievances
            WHERE user_id = $1
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to list owned grievances: {error}")))?;

        rows.into_iter().map(Grievance::try_from).collect()
    }

    async fn list_all(&self) -> AppResult<Vec<Grievance>> {
        let rows = sqlx::query_as::<_, GrievanceRow>(
            r#"
            SELECT id, user_id, title, description, status, file_urls,
                   submitted_at, last_updated, version
            FROM grievances
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to list grievances: {error}")))?;

        rows.into_iter().map(Grievance::try_from).collect()
    }

    async fn update_status(&self, id: GrievanceId, update: StatusUpdate) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE grievances
            SET status = $1, last_updated = $2, version = version + 1
            WHERE id = $3 AND version = $4
            "#,
        )
        .bind(update.status.as_str())
        .bind(update.last_updated)
        .bind(id.as_uuid())
        .bind(update.expected_version)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to update grievance status: {error}")))?;

        if result.rows_affected() > 0 {
            return Ok(());
        }

        // Nothing matched: distinguish a missing record from a lost race.
        let stored_version: Option<i64> =
            sqlx::query_scalar("SELECT version FROM grievances WHERE id = $1")
                .bind(id.as_uuid())
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Storage(format!("failed to check grievance version: {error}"))
                })?;

        match stored_version {
            None => Err(AppError::NotFound(format!("grievance '{id}' does not exist"))),
            Some(version) => Err(AppError::Conflict(format!(
                "grievance '{id}' changed since it was read: stored version {version}, expected {}",
                update.expected_version
            ))),
        }
    }
}
