use std::collections::HashMap;

use async_trait::async_trait;
use redressa_application::{GrievanceRepository, StatusUpdate};
use redressa_core::{AppError, AppResult};
use redressa_domain::{Grievance, GrievanceId};
use tokio::sync::RwLock;

/// In-memory grievance repository implementation.
#[derive(Debug, Default)]
pub struct InMemoryGrievanceRepository {
    grievances: RwLock<HashMap<GrievanceId, Grievance>>,
}

impl InMemoryGrievanceRepository {
    /// Creates an empty in-memory repository.
    #[must_use]
    pub fn new() -> Self {
        Self {
            grievances: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl GrievanceRepository for InMemoryGrievanceRepository {
    async fn create(&self, grievance: Grievance) -> AppResult<()> {
        let mut grievances = self.grievances.write().await;

        if grievances.contains_key(&grievance.id()) {
            return Err(AppError::Conflict(format!(
                "grievance '{}' already exists",
                grievance.id()
            )));
        }

        grievances.insert(grievance.id(), grievance);
        Ok(())
    }

    async fn find_by_id(&self, id: GrievanceId) -> AppResult<Option<Grievance>> {
        Ok(self.grievances.read().await.get(&id).cloned())
    }

    async fn list_owned_by(&self, subject: &str) -> AppResult<Vec<Grievance>> {
        let grievances = self.grievances.read().await;

        let mut owned: Vec<Grievance> = grievances
            .values()
            .filter(|grievance| grievance.user_id() == subject)
            .cloned()
            .collect();
        owned.sort_by_key(|grievance| grievance.id().as_uuid());

        Ok(owned)
    }

    async fn list_all(&self) -> AppResult<Vec<Grievance>> {
        let grievances = self.grievances.read().await;

        let mut all: Vec<Grievance> = grievances.values().cloned().collect();
        all.sort_by_key(|grievance| grievance.id().as_uuid());

        Ok(all)
    }

    async fn update_status(&self, id: GrievanceId, update: StatusUpdate) -> AppResult<()> {
        let mut grievances = self.grievances.write().await;

        let Some(stored) = grievances.get(&id) else {
            return Err(AppError::NotFound(format!("grievance '{id}' does not exist")));
        };

        if stored.version() != update.expected_version {
            return Err(AppError::Conflict(format!(
                "grievance '{id}' changed since it was read: stored version {}, expected {}",
                stored.version(),
                update.expected_version
            )));
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
