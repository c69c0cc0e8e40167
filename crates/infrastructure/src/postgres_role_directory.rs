//! PostgreSQL-backed role directory using the `role_profiles` table.

use std::str::FromStr;

use async_trait::async_trait;
use redressa_application::RoleDirectory;
use redressa_core::{AppError, AppResult};
use redressa_domain::{EmailAddress, Role, UserProfile};
use sqlx::PgPool;

/// PostgreSQL implementation of the role directory port.
#[derive(Clone)]
pub struct PostgresRoleDirectory {
    pool: PgPool,
}

impl PostgresRoleDirectory {
    /// Creates a directory with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    subject: String,
    name: String,
    email: String,
    role: String,
}

impl TryFrom<ProfileRow> for UserProfile {
    type Error = AppError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        UserProfile::new(
            row.subject,
            row.name,
            EmailAddress::new(row.email)?,
            Role::from_str(row.role.as_str())?,
        )
    }
}

#[async_trait]
impl RoleDirectory for PostgresRoleDirectory {
    async fn role_for_subject(&self, subject: &str) -> AppResult<Option<Role>> {
        let role: Option<String> =
            sqlx::query_scalar("SELECT role FROM role_profiles WHERE subject = $1")
                .bind(subject)
                .fetch_optional(&self.pool)
                .await
                .map_err(|error| {
                    AppError::Storage(format!("failed to look up role for subject: {error}"))
                })?;

        role.map(|value| Role::from_str(value.as_str())).transpose()
    }

    async fn find_profile(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query_as::<_, ProfileRow>(
            r#"
            SELECT subject, name, email, role
            FROM role_profiles
            WHERE subject = $1
            "#,
        )
        .bind(subject)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to load profile: {error}")))?;

        row.map(UserProfile::try_from).transpose()
    }

    async fn create_profile(&self, profile: UserProfile) -> AppResult<()> {
        let result = sqlx::query(
            r#"
            INSERT INTO role_profiles (subject, name, email, role)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (subject) DO NOTHING
            "#,
        )
        .bind(profile.subject())
        .bind(profile.name().as_str())
        .bind(profile.email().as_str())
        .bind(profile.role().as_str())
        .execute(&self.pool)
        .await
        .map_err(|error| AppError::Storage(format!("failed to create profile: {error}")))?;

        if result.rows_affected() == 0 {
            return Err(AppError::Conflict(format!(
                "profile for subject '{}' already exists",
                profile.subject()
            )));
        }

        Ok(())
    }
}
