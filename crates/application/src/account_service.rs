//! Account ports and application service.
//!
//! Owns registration, password authentication and account lockout. Follows
//! OWASP guidelines for generic error messages and constant-time responses.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redressa_core::{AppError, AppResult};
use redressa_domain::{EmailAddress, Role, UserProfile, validate_password};
use uuid::Uuid;

use crate::grievance_ports::RoleDirectory;

/// Credential record returned by repository queries.
#[derive(Debug, Clone)]
pub struct CredentialRecord {
    /// Unique account identifier; its string form is the session subject.
    pub id: Uuid,
    /// Canonical email address.
    pub email: String,
    /// Argon2id password hash, or `None` for OAuth-only accounts.
    pub password_hash: Option<String>,
    /// Number of consecutive failed login attempts.
    pub failed_login_count: i32,
    /// Account is locked until this time, if set.
    pub locked_until: Option<DateTime<Utc>>,
}

/// Repository port for credential persistence.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Finds an account by email (case-insensitive).
    async fn find_by_email(&self, email: &str) -> AppResult<Option<CredentialRecord>>;

    /// Finds an account by its unique identifier.
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<CredentialRecord>>;

    /// Creates a new account. Returns the assigned identifier.
    async fn create(&self, email: &str, password_hash: Option<&str>) -> AppResult<Uuid>;

    /// Increments the failed login counter and optionally locks the account.
    async fn record_failed_login(&self, id: Uuid) -> AppResult<()>;

    /// Resets the failed login counter and removes any account lock.
    async fn reset_failed_logins(&self, id: Uuid) -> AppResult<()>;
}

/// Port for password hashing operations. Keeps domain/application free of
/// direct cryptographic library coupling.
pub trait PasswordHasher: Send + Sync {
    /// Hashes a plaintext password using Argon2id.
    fn hash_password(&self, password: &str) -> AppResult<String>;

    /// Verifies a plaintext password against a stored hash.
    /// Must run in constant time regardless of validity.
    fn verify_password(&self, password: &str, hash: &str) -> AppResult<bool>;
}

/// Result of a login attempt.
#[derive(Debug)]
pub enum AuthOutcome {
    /// Authentication succeeded; the profile carries the directory role.
    Authenticated(UserProfile),
    /// Authentication failed. Generic outcome prevents enumeration.
    Failed,
}

/// Parameters for user registration.
#[derive(Debug)]
pub struct RegisterParams {
    /// Email address for the new account.
    pub email: String,
    /// Plaintext password (validated against OWASP rules).
    pub password: String,
    /// Display name recorded in the role directory.
    pub name: String,
    /// Role chosen at signup; fixed for the lifetime of the profile.
    pub role: Role,
}

/// Application service for registration and password authentication.
#[derive(Clone)]
pub struct AccountService {
    user_repository: Arc<dyn UserRepository>,
    password_hasher: Arc<dyn PasswordHasher>,
    role_directory: Arc<dyn RoleDirectory>,
}

impl AccountService {
    /// Creates a new account service.
    #[must_use]
    pub fn new(
        user_repository: Arc<dyn UserRepository>,
        password_hasher: Arc<dyn PasswordHasher>,
        role_directory: Arc<dyn RoleDirectory>,
    ) -> Self {
        Self {
            user_repository,
            password_hasher,
            role_directory,
        }
    }

    /// Registers a new account and its role directory profile.
    pub async fn register(&self, params: RegisterParams) -> AppResult<UserProfile> {
        let email_address = EmailAddress::new(&params.email)?;
        validate_password(&params.password)?;

        let existing = self
            .user_repository
            .find_by_email(email_address.as_str())
            .await?;

        if existing.is_some() {
            // OWASP: do not reveal that the account exists.
            // Still hash the password to prevent timing side-channels.
            let _ = self.password_hasher.hash_password(&params.password);
            return Err(AppError::Conflict(
                "an account could not be created with the provided details".to_owned(),
            ));
        }

        let password_hash = self.password_hasher.hash_password(&params.password)?;
        let account_id = self
            .user_repository
            .create(email_address.as_str(), Some(&password_hash))
            .await?;

        let profile = UserProfile::new(
            account_id.to_string(),
            params.name,
            email_address,
            params.role,
        )?;
        self.role_directory.create_profile(profile.clone()).await?;

        tracing::info!(subject = profile.subject(), role = profile.role().as_str(), "account registered");

        Ok(profile)
    }

    /// Authenticates an account with email and password.
    ///
    /// Returns `AuthOutcome::Failed` for any failure (unknown email, wrong
    /// password, locked account, passwordless account) to prevent
    /// enumeration.
    pub async fn login(&self, email: &str, password: &str) -> AppResult<AuthOutcome> {
        let account = self.user_repository.find_by_email(email).await?;

        let Some(account) = account else {
            // OWASP: always hash to prevent timing attacks even when the
            // account is unknown.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        if let Some(locked_until) = account.locked_until {
            if Utc::now() < locked_until {
                let _ = self.password_hasher.hash_password(password);
                return Ok(AuthOutcome::Failed);
            }
        }

        let Some(ref stored_hash) = account.password_hash else {
            // OAuth-only account attempting password login.
            let _ = self.password_hasher.hash_password(password);
            return Ok(AuthOutcome::Failed);
        };

        let password_valid = self.password_hasher.verify_password(password, stored_hash)?;

        if !password_valid {
            self.user_repository.record_failed_login(account.id).await?;
            return Ok(AuthOutcome::Failed);
        }

        self.user_repository.reset_failed_logins(account.id).await?;

        let subject = account.id.to_string();
        let profile = self
            .role_directory
            .find_profile(&subject)
            .await?
            .ok_or_else(|| {
                AppError::Internal(format!("role profile missing for subject '{subject}'"))
            })?;

        Ok(AuthOutcome::Authenticated(profile))
    }

    /// Returns the directory profile for a subject, if one exists.
    pub async fn find_profile(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        self.role_directory.find_profile(subject).await
    }

    /// Ensures a role directory profile exists for an OAuth principal.
    ///
    /// Creates the profile on first login with the role carried by the
    /// validated state token; subsequent logins return the stored profile
    /// and ignore the requested role.
    pub async fn ensure_oauth_profile(
        &self,
        subject: &str,
        name: &str,
        email: &str,
        role: Role,
    ) -> AppResult<UserProfile> {
        if let Some(profile) = self.role_directory.find_profile(subject).await? {
            return Ok(profile);
        }

        let profile = UserProfile::new(subject, name, EmailAddress::new(email)?, role)?;
        self.role_directory.create_profile(profile.clone()).await?;

        tracing::info!(subject, role = role.as_str(), "oauth profile created");

        Ok(profile)
    }
}
