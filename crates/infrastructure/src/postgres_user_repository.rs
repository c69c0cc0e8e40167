//! PostgreSQL-backed credential repository using the `accounts` table.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redressa_application::{CredentialRecord, UserRepository};
use redressa_core::{AppError, AppResult};
use sqlx::PgPool;
use uuid::Uuid;

/// Consecutive failures after which an account is temporarily locked.
const LOCKOUT_THRESHOLD: i32 = 5;

/// Lock duration in minutes once the threshold is reached.
const LOCKOUT_MINUTES: i64 = 15;

/// PostgreSQL implementation of the credential repository port.
#[derive(Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    email: String,
    password_hash: Option<String>,
    failed_login_count: i32,
    locked_until: Option<DateTime<Utc>>,
}

impl From<AccountRow> for CredentialRecord {
    fn from(row: AccountRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            failed_login_count: row.failed_login_count,
            locked_until: row.locked_until,
        }
    }
}

#[async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &str) -> AppResult<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, password_hash, failed_login_count, locked_until
            FROM accounts
            WHERE lower(email) = lower($1)
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to load account by email: {error}")))?;

        Ok(row.map(CredentialRecord::from))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CredentialRecord>> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, email, password_hash, failed_login_count, locked_until
            FROM accounts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to load account by id: {error}")))?;

        Ok(row.map(CredentialRecord::from))
    }

    async fn create(&self, email: &str, password_hash: Option<&str>) -> AppResult<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO accounts (email, password_hash)
            VALUES ($1, $2)
            RETURNING id
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to create account: {error}")))?;

        Ok(id)
    }

    async fn record_failed_login(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET
                failed_login_count = failed_login_count + 1,
                locked_until = CASE
                    WHEN failed_login_count + 1 >= $2
                    THEN now() + make_interval(mins => $3::float8)
                    ELSE locked_until
                END
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(LOCKOUT_THRESHOLD)
        .bind(LOCKOUT_MINUTES as f64)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to record failed login: {error}")))?;

        Ok(())
    }

    async fn reset_failed_logins(&self, id: Uuid) -> AppResult<()> {
        sqlx::query(
            r#"
            UPDATE accounts
            SET failed_login_count = 0, locked_until = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to reset failed logins: {error}")))?;

        Ok(())
    }
}
