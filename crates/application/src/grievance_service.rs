//! Grievance lifecycle controller.
//!
//! Owns submission, scoped listing and the role-gated status transitions.
//! The caller's role is re-derived from the role directory on every
//! privileged operation; a cached or client-supplied role flag is never
//! consulted.

use std::sync::Arc;

use chrono::Utc;
use redressa_core::{AppError, AppResult, UserIdentity};
use redressa_domain::{
    Grievance, GrievanceBoard, GrievanceId, GrievanceStatus, MAX_ATTACHMENTS_PER_GRIEVANCE, Role,
};

use crate::grievance_ports::{
    BlobStore, GrievanceRepository, RoleDirectory, StatusUpdate, SubmitGrievanceInput,
};

/// Application service for grievance submission and lifecycle transitions.
#[derive(Clone)]
pub struct GrievanceService {
    repository: Arc<dyn GrievanceRepository>,
    blob_store: Arc<dyn BlobStore>,
    role_directory: Arc<dyn RoleDirectory>,
}

impl GrievanceService {
    /// Creates a new grievance service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn GrievanceRepository>,
        blob_store: Arc<dyn BlobStore>,
        role_directory: Arc<dyn RoleDirectory>,
    ) -> Self {
        Self {
            repository,
            blob_store,
            role_directory,
        }
    }

    /// Submits a new grievance on behalf of the authenticated actor.
    ///
    /// Attachments are uploaded sequentially in the given order; a single
    /// failed upload fails the whole submission and no grievance record is
    /// created. Already-uploaded blobs from the failed attempt are not
    /// compensated; the blob store offers no transaction to do so.
    pub async fn submit(
        &self,
        actor: &UserIdentity,
        input: SubmitGrievanceInput,
    ) -> AppResult<Grievance> {
        let title = input.title.trim();
        if title.is_empty() {
            return Err(AppError::Validation(
                "grievance title must not be empty".to_owned(),
            ));
        }

        let description = input.description.trim();
        if description.is_empty() {
            return Err(AppError::Validation(
                "grievance description must not be empty".to_owned(),
            ));
        }

        if input.attachments.len() > MAX_ATTACHMENTS_PER_GRIEVANCE {
            return Err(AppError::Validation(format!(
                "a grievance may carry at most {MAX_ATTACHMENTS_PER_GRIEVANCE} attachments"
            )));
        }

        let mut file_urls = Vec::with_capacity(input.attachments.len());
        for attachment in &input.attachments {
            let file_url = self
                .blob_store
                .store(
                    attachment.file_name().as_str(),
                    attachment.content_type(),
                    attachment.bytes().to_vec(),
                )
                .await?;
            file_urls.push(file_url);
        }

        let grievance = Grievance::submit(actor.subject(), title, description, file_urls)?;
        self.repository.create(grievance.clone()).await?;

        tracing::info!(
            grievance_id = %grievance.id(),
            subject = actor.subject(),
            attachments = grievance.file_urls().len(),
            "grievance submitted"
        );

        Ok(grievance)
    }

    /// Lists the grievances owned by the actor.
    pub async fn list_owned(&self, actor: &UserIdentity) -> AppResult<Vec<Grievance>> {
        self.repository.list_owned_by(actor.subject()).await
    }

    /// Lists every grievance. Administrators only.
    pub async fn list_all(&self, actor: &UserIdentity) -> AppResult<Vec<Grievance>> {
        self.require_admin(actor).await?;
        self.repository.list_all().await
    }

    /// Lists the grievances visible to the actor: the full set for
    /// administrators, the owned set for everyone else.
    pub async fn list_visible(&self, actor: &UserIdentity) -> AppResult<Vec<Grievance>> {
        if self.actor_role(actor).await?.is_some_and(|role| role.is_admin()) {
            self.repository.list_all().await
        } else {
            self.repository.list_owned_by(actor.subject()).await
        }
    }

    /// Returns the actor-visible set partitioned into active and past.
    pub async fn dashboard(&self, actor: &UserIdentity) -> AppResult<GrievanceBoard> {
        let grievances = self.list_visible(actor).await?;
        Ok(GrievanceBoard::partition(grievances))
    }

    /// Returns a single grievance, readable by its owner or an admin.
    pub async fn get(&self, actor: &UserIdentity, id: GrievanceId) -> AppResult<Grievance> {
        let grievance = self.require_grievance(id).await?;

        if grievance.user_id() != actor.subject() {
            self.require_admin(actor).await?;
        }

        Ok(grievance)
    }

    /// Transitions a grievance to the requested status.
    ///
    /// The transition is checked against the lifecycle table before the
    /// store is touched; the caller must be an administrator and must
    /// present the version it last read.
    pub async fn transition(
        &self,
        actor: &UserIdentity,
        id: GrievanceId,
        requested: GrievanceStatus,
        expected_version: i64,
    ) -> AppResult<Grievance> {
        self.require_admin(actor).await?;

        let mut grievance = self.require_grievance(id).await?;

        if grievance.version() != expected_version {
            return Err(AppError::Conflict(format!(
                "grievance '{id}' changed since it was read: stored version {}, expected {expected_version}",
                grievance.version()
            )));
        }

        grievance.apply_transition(requested, Utc::now())?;

        self.repository
            .update_status(
                id,
                StatusUpdate {
                    status: requested,
                    last_updated: grievance.last_updated(),
                    expected_version,
                },
            )
            .await?;

        tracing::info!(
            grievance_id = %id,
            subject = actor.subject(),
            status = requested.as_str(),
            "grievance status transitioned"
        );

        Ok(grievance)
    }

    async fn actor_role(&self, actor: &UserIdentity) -> AppResult<Option<Role>> {
        self.role_directory.role_for_subject(actor.subject()).await
    }

    async fn require_admin(&self, actor: &UserIdentity) -> AppResult<()> {
        match self.actor_role(actor).await? {
            Some(role) if role.is_admin() => Ok(()),
            _ => Err(AppError::Forbidden(format!(
                "subject '{}' is not an administrator",
                actor.subject()
            ))),
        }
    }

    async fn require_grievance(&self, id: GrievanceId) -> AppResult<Grievance> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("grievance '{id}' does not exist")))
    }
}

#[cfg(test)]
mod tests;
