use std::collections::HashMap;

use async_trait::async_trait;
use redressa_application::BlobStore;
use redressa_core::AppResult;
use tokio::sync::RwLock;
use uuid::Uuid;

/// In-memory blob store implementation for tests and local development.
#[derive(Debug, Default)]
pub struct InMemoryBlobStore {
    blobs: RwLock<HashMap<String, (String, Vec<u8>)>>,
}

impl InMemoryBlobStore {
    /// Creates an empty in-memory blob store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            blobs: RwLock::new(HashMap::new()),
        }
    }

    /// Returns the number of stored blobs.
    pub async fn len(&self) -> usize {
        self.blobs.read().await.len()
    }

    /// Returns whether the store holds no blobs.
    pub async fn is_empty(&self) -> bool {
        self.blobs.read().await.is_empty()
    }
}

#[async_trait]
impl BlobStore for InMemoryBlobStore {
    async fn store(
        &self,
        _file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        let url = format!("memory://{}", Uuid::new_v4());
        self.blobs
            .write()
            .await
            .insert(url.clone(), (content_type.to_owned(), bytes));
        Ok(url)
    }
}

#[cfg(test)]
mod tests {
    use redressa_application::BlobStore;
    use redressa_core::AppResult;

    use super::InMemoryBlobStore;

    #[tokio::test]
    async fn stored_blobs_yield_unique_urls() -> AppResult<()> {
        let store = InMemoryBlobStore::new();

        let first = store
            .store("a.pdf", "application/pdf", vec![1, 2, 3])
            .await?;
        let second = store
            .store("a.pdf", "application/pdf", vec![4, 5, 6])
            .await?;

        assert_ne!(first, second);
        assert_eq!(store.len().await, 2);
        Ok(())
    }
}
