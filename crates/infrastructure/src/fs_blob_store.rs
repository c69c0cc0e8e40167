//! Filesystem-backed blob store.
//!
//! Saves uploads under a configured directory with generated names and
//! returns durable URLs beneath a configured public base. The API serves
//! the directory statically, so a returned URL stays viewable for the
//! lifetime of the record.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use redressa_application::BlobStore;
use redressa_core::{AppError, AppResult};
use uuid::Uuid;

/// Filesystem implementation of the blob store port.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_base_url: String,
}

impl FsBlobStore {
    /// Creates a blob store rooted at `root`.
    ///
    /// `public_base_url` is the externally reachable prefix under which the
    /// root directory is served (e.g. `http://localhost:3001/files`).
    #[must_use]
    pub fn new(root: impl Into<PathBuf>, public_base_url: impl Into<String>) -> Self {
        let public_base_url = public_base_url.into().trim_end_matches('/').to_owned();
        Self {
            root: root.into(),
            public_base_url,
        }
    }

    /// Returns the directory uploads are written to.
    #[must_use]
    pub fn root(&self) -> &Path {
        self.root.as_path()
    }
}

#[async_trait]
impl BlobStore for FsBlobStore {
    async fn store(
        &self,
        file_name: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> AppResult<String> {
        tokio::fs::create_dir_all(&self.root)
            .await
            .map_err(|error| {
                AppError::Storage(format!("failed to prepare upload directory: {error}"))
            })?;

        let object_name = match sanitized_extension(file_name) {
            Some(extension) => format!("{}.{extension}", Uuid::new_v4()),
            None => Uuid::new_v4().to_string(),
        };

        let path = self.root.join(&object_name);
        tokio::fs::write(&path, &bytes).await.map_err(|error| {
            AppError::Storage(format!("failed to write upload '{object_name}': {error}"))
        })?;

        tracing::debug!(%object_name, content_type, size = bytes.len(), "upload stored");

        Ok(format!("{}/{object_name}", self.public_base_url))
    }
}

/// Extracts a lowercase alphanumeric extension, if the name carries one.
fn sanitized_extension(file_name: &str) -> Option<String> {
    let extension = Path::new(file_name).extension()?.to_str()?;

    if extension.is_empty() || !extension.chars().all(|character| character.is_ascii_alphanumeric())
    {
        return None;
    }

    Some(extension.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use redressa_application::BlobStore;
    use redressa_core::AppResult;

    use super::{FsBlobStore, sanitized_extension};

    #[test]
    fn extension_is_sanitized() {
        assert_eq!(sanitized_extension("scan.PDF"), Some("pdf".to_owned()));
        assert_eq!(sanitized_extension("archive.tar.gz"), Some("gz".to_owned()));
        assert_eq!(sanitized_extension("no-extension"), None);
        assert_eq!(sanitized_extension("weird.p!f"), None);
    }

    #[tokio::test]
    async fn stored_file_lands_under_root_with_public_url() -> AppResult<()> {
        let directory = std::env::temp_dir().join(format!("redressa-blob-{}", uuid::Uuid::new_v4()));
        let store = FsBlobStore::new(&directory, "http://localhost:3001/files/");

        let url = store
            .store("scan.pdf", "application/pdf", vec![0x25, 0x50, 0x44, 0x46])
            .await?;

        assert!(url.starts_with("http://localhost:3001/files/"));
        assert!(url.ends_with(".pdf"));

        let object_name = url.rsplit('/').next().unwrap_or_default();
        let written = tokio::fs::read(directory.join(object_name)).await;
        assert!(written.is_ok_and(|bytes| bytes == vec![0x25, 0x50, 0x44, 0x46]));

        let _ = tokio::fs::remove_dir_all(&directory).await;
        Ok(())
    }
}
