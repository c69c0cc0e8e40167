use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use redressa_core::{AppError, AppResult, UserIdentity};
use redressa_domain::{
    AttachmentUpload, EmailAddress, Grievance, GrievanceId, GrievanceStatus, Role, UserProfile,
};

use crate::grievance_ports::{
    BlobStore, GrievanceRepository, RoleDirectory, StatusUpdate, SubmitGrievanceInput,
};

use super::GrievanceService;

#[derive(Default)]
struct FakeGrievanceRepository {
    grievances: Mutex<HashMap<GrievanceId, Grievance>>,
}

impl FakeGrievanceRepository {
    async fn seed(&self, grievance: Grievance) {
        self.grievances
            .lock()
            .await
            .insert(grievance.id(), grievance);
    }

    async fn count(&self) -> usize {
        self.grievances.lock().await.len()
    }

    async fn stored(&self, id: GrievanceId) -> Option<Grievance> {
        self.grievances.lock().await.get(&id).cloned()
    }
}

#[async_trait]
impl GrievanceRepository for FakeGrievanceRepository {
    async fn create(&self, grievance: Grievance) -> AppResult<()> {
        self.grievances
            .lock()
            .await
            .insert(grievance.id(), grievance);
        Ok(())
    }

    async fn find_by_id(&self, id: GrievanceId) -> AppResult<Option<Grievance>> {
        Ok(self.grievances.lock().await.get(&id).cloned())
    }

    async fn list_owned_by(&self, subject: &str) -> AppResult<Vec<Grievance>> {
        Ok(self
            .grievances
            .lock()
            .await
            .values()
            .filter(|grievance| grievance.user_id() == subject)
            .cloned()
            .collect())
    }

    async fn list_all(&self) -> AppResult<Vec<Grievance>> {
        Ok(self.grievances.lock().await.values().cloned().collect())
    }

    async fn update_status(&self, id: GrievanceId, update: StatusUpdate) -> AppResult<()> {
        let mut grievances = self.grievances.lock().await;
        let Some(stored) = grievances.get(&id) else {
            return Err(AppError::NotFound(format!("grievance '{id}'")));
        };

        if stored.version() != update.expected_version {
            return Err(AppError::Conflict(format!("grievance '{id}' version")));
        }

        let updated = Grievance::from_stored(
            stored.id(),
            stored.user_id(),
            stored.title().as_str(),
            stored.description().as_str(),
            update.status,
            stored.file_urls().to_vec(),
            stored.submitted_at(),
            update.last_updated,
            update.expected_version + 1,
        )?;
        grievances.insert(id, updated);
        Ok(())
    }
}

#[derive(Default)]
struct FakeBlobStore {
    fail: bool,
    stored: Mutex<Vec<String>>,
}

impl FakeBlobStore {
    fn failing() -> Self {
        Self {
            fail: true,
            stored: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl BlobStore for FakeBlobStore {
    async fn store(
        &self,
        file_name: &str,
        _content_type: &str,
        _bytes: Vec<u8>,
    ) -> AppResult<String> {
        if self.fail {
            return Err(AppError::Storage("blob store unavailable".to_owned()));
        }

        let mut stored = self.stored.lock().await;
        let url = format!("https://files.example.com/{}/{file_name}", stored.len());
        stored.push(url.clone());
        Ok(url)
    }
}

struct FakeRoleDirectory {
    roles: HashMap<String, Role>,
}

impl FakeRoleDirectory {
    fn new(entries: &[(&str, Role)]) -> Self {
        Self {
            roles: entries
                .iter()
                .map(|(subject, role)| ((*subject).to_owned(), *role))
                .collect(),
        }
    }
}

#[async_trait]
impl RoleDirectory for FakeRoleDirectory {
    async fn role_for_subject(&self, subject: &str) -> AppResult<Option<Role>> {
        Ok(self.roles.get(subject).copied())
    }

    async fn find_profile(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        let Some(role) = self.roles.get(subject) else {
            return Ok(None);
        };

        let email = EmailAddress::new(format!("{subject}@example.com"))?;
        Ok(Some(UserProfile::new(subject, subject, email, *role)?))
    }

    async fn create_profile(&self, _profile: UserProfile) -> AppResult<()> {
        Ok(())
    }
}

fn actor(subject: &str) -> UserIdentity {
    UserIdentity::new(subject, subject, None)
}

fn service_with(
    repository: Arc<FakeGrievanceRepository>,
    blob_store: Arc<FakeBlobStore>,
) -> GrievanceService {
    let directory = FakeRoleDirectory::new(&[("u1", Role::User), ("u2", Role::User), ("a1", Role::Admin)]);
    GrievanceService::new(repository, blob_store, Arc::new(directory))
}

fn attachment(name: &str) -> AttachmentUpload {
    AttachmentUpload::new(name, "application/pdf", vec![0x25, 0x50, 0x44, 0x46])
        .unwrap_or_else(|_| panic!("attachment must be valid"))
}

fn seeded(status: GrievanceStatus, subject: &str) -> Grievance {
    let submitted = Utc::now() - Duration::hours(3);
    Grievance::from_stored(
        GrievanceId::new(),
        subject,
        "Noise complaint",
        "Loud construction at night",
        status,
        Vec::new(),
        submitted,
        submitted,
        1,
    )
    .unwrap_or_else(|_| panic!("seeded grievance must be valid"))
}

#[tokio::test]
async fn submit_creates_pending_grievance() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    let grievance = service
        .submit(
            &actor("u1"),
            SubmitGrievanceInput {
                title: "Noise complaint".to_owned(),
                description: "Loud construction at night".to_owned(),
                attachments: Vec::new(),
            },
        )
        .await?;

    assert_eq!(grievance.status(), GrievanceStatus::Pending);
    assert_eq!(grievance.user_id(), "u1");
    assert!(grievance.file_urls().is_empty());
    assert_eq!(grievance.submitted_at(), grievance.last_updated());
    assert_eq!(repository.count().await, 1);
    Ok(())
}

#[tokio::test]
async fn submit_rejects_blank_fields_without_creating_a_record() {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    for (title, description) in [("   ", "detail"), ("title", "\n\t ")] {
        let outcome = service
            .submit(
                &actor("u1"),
                SubmitGrievanceInput {
                    title: title.to_owned(),
                    description: description.to_owned(),
                    attachments: Vec::new(),
                },
            )
            .await;
        assert!(matches!(outcome, Err(AppError::Validation(_))));
    }

    assert_eq!(repository.count().await, 0);
}

#[tokio::test]
async fn submit_rejects_more_than_five_attachments() {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    let attachments = (0..6).map(|index| attachment(&format!("{index}.pdf"))).collect();
    let outcome = service
        .submit(
            &actor("u1"),
            SubmitGrievanceInput {
                title: "title".to_owned(),
                description: "detail".to_owned(),
                attachments,
            },
        )
        .await;

    assert!(matches!(outcome, Err(AppError::Validation(_))));
    assert_eq!(repository.count().await, 0);
}

#[tokio::test]
async fn submit_preserves_attachment_order() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    let grievance = service
        .submit(
            &actor("u1"),
            SubmitGrievanceInput {
                title: "title".to_owned(),
                description: "detail".to_owned(),
                attachments: vec![
                    attachment("first.pdf"),
                    attachment("second.pdf"),
                    attachment("third.pdf"),
                ],
            },
        )
        .await?;

    let names: Vec<&str> = grievance
        .file_urls()
        .iter()
        .map(|url| url.rsplit('/').next().unwrap_or_default())
        .collect();
    assert_eq!(names, ["first.pdf", "second.pdf", "third.pdf"]);
    Ok(())
}

#[tokio::test]
async fn submit_fails_whole_operation_when_an_upload_fails() {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::failing()));

    let outcome = service
        .submit(
            &actor("u1"),
            SubmitGrievanceInput {
                title: "title".to_owned(),
                description: "detail".to_owned(),
                attachments: vec![attachment("scan.pdf")],
            },
        )
        .await;

    assert!(matches!(outcome, Err(AppError::Storage(_))));
    assert_eq!(repository.count().await, 0);
}

#[tokio::test]
async fn transition_rejects_non_admin_regardless_of_requested_status() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let grievance = seeded(GrievanceStatus::Pending, "u1");
    let id = grievance.id();
    repository.seed(grievance.clone()).await;
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    for requested in [
        GrievanceStatus::Pending,
        GrievanceStatus::InProgress,
        GrievanceStatus::Resolved,
        GrievanceStatus::Rejected,
    ] {
        let outcome = service.transition(&actor("u1"), id, requested, 1).await;
        assert!(matches!(outcome, Err(AppError::Forbidden(_))));
    }

    assert_eq!(repository.stored(id).await, Some(grievance));
    Ok(())
}

#[tokio::test]
async fn admin_transition_pending_to_in_progress_succeeds() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let grievance = seeded(GrievanceStatus::Pending, "u1");
    let id = grievance.id();
    let previous_update = grievance.last_updated();
    repository.seed(grievance).await;
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    let updated = service
        .transition(&actor("a1"), id, GrievanceStatus::InProgress, 1)
        .await?;

    assert_eq!(updated.status(), GrievanceStatus::InProgress);
    assert!(updated.last_updated() > previous_update);
    assert_eq!(updated.version(), 2);

    let stored = repository.stored(id).await;
    assert!(stored.is_some_and(|value| value.status() == GrievanceStatus::InProgress));
    Ok(())
}

#[tokio::test]
async fn transition_rejects_pending_to_resolved() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let grievance = seeded(GrievanceStatus::Pending, "u1");
    let id = grievance.id();
    repository.seed(grievance.clone()).await;
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    let outcome = service
        .transition(&actor("a1"), id, GrievanceStatus::Resolved, 1)
        .await;

    assert!(matches!(outcome, Err(AppError::InvalidTransition(_))));
    assert_eq!(repository.stored(id).await, Some(grievance));
    Ok(())
}

#[tokio::test]
async fn transition_rejects_leaving_a_terminal_state() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let grievance = seeded(GrievanceStatus::Resolved, "u1");
    let id = grievance.id();
    repository.seed(grievance.clone()).await;
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    let outcome = service
        .transition(&actor("a1"), id, GrievanceStatus::Rejected, 1)
        .await;

    assert!(matches!(outcome, Err(AppError::InvalidTransition(_))));
    assert_eq!(repository.stored(id).await, Some(grievance));
    Ok(())
}

#[tokio::test]
async fn transition_with_stale_version_conflicts() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let grievance = seeded(GrievanceStatus::Pending, "u1");
    let id = grievance.id();
    repository.seed(grievance.clone()).await;
    let service = service_with(repository.clone(), Arc::new(FakeBlobStore::default()));

    let outcome = service
        .transition(&actor("a1"), id, GrievanceStatus::InProgress, 7)
        .await;

    assert!(matches!(outcome, Err(AppError::Conflict(_))));
    assert_eq!(repository.stored(id).await, Some(grievance));
    Ok(())
}

#[tokio::test]
async fn transition_on_missing_grievance_is_not_found() {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    let outcome = service
        .transition(&actor("a1"), GrievanceId::new(), GrievanceStatus::InProgress, 1)
        .await;

    assert!(matches!(outcome, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn list_owned_filters_by_subject() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    repository.seed(seeded(GrievanceStatus::Pending, "u1")).await;
    repository.seed(seeded(GrievanceStatus::Pending, "u2")).await;
    repository.seed(seeded(GrievanceStatus::Resolved, "u1")).await;
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    let owned = service.list_owned(&actor("u1")).await?;
    assert_eq!(owned.len(), 2);
    assert!(owned.iter().all(|grievance| grievance.user_id() == "u1"));
    Ok(())
}

#[tokio::test]
async fn list_all_requires_admin() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    repository.seed(seeded(GrievanceStatus::Pending, "u1")).await;
    repository.seed(seeded(GrievanceStatus::Pending, "u2")).await;
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    let outcome = service.list_all(&actor("u1")).await;
    assert!(matches!(outcome, Err(AppError::Forbidden(_))));

    let all = service.list_all(&actor("a1")).await?;
    assert_eq!(all.len(), 2);
    Ok(())
}

#[tokio::test]
async fn list_visible_scopes_by_role() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    repository.seed(seeded(GrievanceStatus::Pending, "u1")).await;
    repository.seed(seeded(GrievanceStatus::Pending, "u2")).await;
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    let for_user = service.list_visible(&actor("u1")).await?;
    assert_eq!(for_user.len(), 1);

    let for_admin = service.list_visible(&actor("a1")).await?;
    assert_eq!(for_admin.len(), 2);
    Ok(())
}

#[tokio::test]
async fn dashboard_partitions_visible_set() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    repository.seed(seeded(GrievanceStatus::Pending, "u1")).await;
    repository.seed(seeded(GrievanceStatus::InProgress, "u1")).await;
    repository.seed(seeded(GrievanceStatus::Rejected, "u1")).await;
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    let board = service.dashboard(&actor("u1")).await?;
    assert_eq!(board.active().len(), 2);
    assert_eq!(board.past().len(), 1);
    Ok(())
}

#[tokio::test]
async fn get_allows_owner_and_admin_but_not_others() -> AppResult<()> {
    let repository = Arc::new(FakeGrievanceRepository::default());
    let grievance = seeded(GrievanceStatus::Pending, "u1");
    let id = grievance.id();
    repository.seed(grievance).await;
    let service = service_with(repository, Arc::new(FakeBlobStore::default()));

    assert!(service.get(&actor("u1"), id).await.is_ok());
    assert!(service.get(&actor("a1"), id).await.is_ok());

    let outcome = service.get(&actor("u2"), id).await;
    assert!(matches!(outcome, Err(AppError::Forbidden(_))));
    Ok(())
}
