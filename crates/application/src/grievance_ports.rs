//! Ports for grievance persistence and the external collaborators the
//! lifecycle depends on.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use redressa_core::AppResult;
use redressa_domain::{AttachmentUpload, Grievance, GrievanceId, GrievanceStatus, Role, UserProfile};

/// Parameters for submitting a new grievance.
#[derive(Debug, Clone)]
pub struct SubmitGrievanceInput {
    /// Short summary of the complaint.
    pub title: String,
    /// Free-text description, unbounded length.
    pub description: String,
    /// Validated attachment payloads, at most five, in upload order.
    pub attachments: Vec<AttachmentUpload>,
}

/// Status mutation applied by an administrator transition.
///
/// The repository must only apply the update when the stored version equals
/// `expected_version`, and must bump the version on success.
#[derive(Debug, Clone, Copy)]
pub struct StatusUpdate {
    /// The validated next status.
    pub status: GrievanceStatus,
    /// Refreshed modification timestamp.
    pub last_updated: DateTime<Utc>,
    /// Version the caller read before requesting the transition.
    pub expected_version: i64,
}

/// Repository port for grievance persistence.
///
/// Administrators only ever mutate `status`, `last_updated` and `version`;
/// no other field has a write path after creation, and no delete operation
/// exists.
#[async_trait]
pub trait GrievanceRepository: Send + Sync {
    /// Persists a newly submitted grievance.
    async fn create(&self, grievance: Grievance) -> AppResult<()>;

    /// Looks up a grievance by identifier.
    async fn find_by_id(&self, id: GrievanceId) -> AppResult<Option<Grievance>>;

    /// Lists grievances owned by the given subject. No ordering promise.
    async fn list_owned_by(&self, subject: &str) -> AppResult<Vec<Grievance>>;

    /// Lists every grievance. No ordering promise.
    async fn list_all(&self) -> AppResult<Vec<Grievance>>;

    /// Applies a version-checked status update.
    ///
    /// Fails with `NotFound` when the record does not exist and with
    /// `Conflict` when the stored version differs from the expected one.
    async fn update_status(&self, id: GrievanceId, update: StatusUpdate) -> AppResult<()>;
}

/// Port for durable attachment storage.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Stores the payload and returns a durable view URL.
    async fn store(&self, file_name: &str, content_type: &str, bytes: Vec<u8>)
    -> AppResult<String>;
}

/// Port for the role directory mapping subjects to role tags.
#[async_trait]
pub trait RoleDirectory: Send + Sync {
    /// Returns the role assigned to the subject, if a profile exists.
    async fn role_for_subject(&self, subject: &str) -> AppResult<Option<Role>>;

    /// Returns the full profile for the subject, if one exists.
    async fn find_profile(&self, subject: &str) -> AppResult<Option<UserProfile>>;

    /// Creates the profile for a subject. Fails with `Conflict` when one
    /// already exists.
    async fn create_profile(&self, profile: UserProfile) -> AppResult<()>;
}

/// Port for the external text-formatting collaborator.
#[async_trait]
pub trait TextFormatter: Send + Sync {
    /// Returns a reformatted rendering of the prompt text.
    async fn format(&self, prompt: &str) -> AppResult<String>;
}
