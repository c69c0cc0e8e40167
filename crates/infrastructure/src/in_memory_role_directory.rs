use std::collections::HashMap;

use async_trait::async_trait;
use redressa_application::RoleDirectory;
use redressa_core::{AppError, AppResult};
use redressa_domain::{Role, UserProfile};
use tokio::sync::RwLock;

/// In-memory role directory implementation.
#[derive(Debug, Default)]
pub struct InMemoryRoleDirectory {
    profiles: RwLock<HashMap<String, UserProfile>>,
}

impl InMemoryRoleDirectory {
    /// Creates an empty in-memory directory.
    #[must_use]
    pub fn new() -> Self {
        Self {
            profiles: RwLock::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl RoleDirectory for InMemoryRoleDirectory {
    async fn role_for_subject(&self, subject: &str) -> AppResult<Option<Role>> {
        Ok(self
            .profiles
            .read()
            .await
            .get(subject)
            .map(UserProfile::role))
    }

    async fn find_profile(&self, subject: &str) -> AppResult<Option<UserProfile>> {
        Ok(self.profiles.read().await.get(subject).cloned())
    }

    async fn create_profile(&self, profile: UserProfile) -> AppResult<()> {
        let mut profiles = self.profiles.write().await;

        if profiles.contains_key(profile.subject()) {
            return Err(AppError::Conflict(format!(
                "profile for subject '{}' already exists",
                profile.subject()
            )));
        }

        profiles.insert(profile.subject().to_owned(), profile);
        Ok(())
    }
}
