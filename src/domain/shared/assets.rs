use std::path::{Path, PathBuf};
use std::sync::Arc;

use super::generation_error::GenerationError;
use crate::infrastructure::repositories::BlobRepository;

/// Writes generated media to a local staging directory and pushes it to blob storage.
///
/// The staged file is removed on every exit from `publish`, including when the
/// future is dropped mid-upload by a timeout or cancellation.
pub struct AssetStager {
    staging_dir: PathBuf,
    blob_repo: Arc<dyn BlobRepository>,
}

/// Deletes the staged file when dropped
struct StagedFile {
    path: PathBuf,
}

impl Drop for StagedFile {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => tracing::warn!(
                path = %self.path.display(),
                error = %e,
                "Failed to remove staged asset"
            ),
        }
    }
}

impl AssetStager {
    pub fn new(staging_dir: impl Into<PathBuf>, blob_repo: Arc<dyn BlobRepository>) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            blob_repo,
        }
    }

    pub fn staging_dir(&self) -> &Path {
        &self.staging_dir
    }

    /// Stage `bytes` as `file_name`, upload it under `remote_key`, then delete the local copy
    pub async fn publish(
        &self,
        file_name: &str,
        bytes: &[u8],
        remote_key: &str,
    ) -> Result<(), GenerationError> {
        tokio::fs::create_dir_all(&self.staging_dir)
            .await
            .map_err(|e| {
                GenerationError::Service(format!(
                    "failed to create staging dir {}: {}",
                    self.staging_dir.display(),
                    e
                ))
            })?;

        let staged = StagedFile {
            path: self.staging_dir.join(file_name),
        };
        tokio::fs::write(&staged.path, bytes).await.map_err(|e| {
            GenerationError::Service(format!(
                "failed to stage {}: {}",
                staged.path.display(),
                e
            ))
        })?;

        let uploaded = self.blob_repo.upload(&staged.path, remote_key).await;
        drop(staged);
        uploaded.map_err(GenerationError::Service)?;

        tracing::debug!(
            remote_key = remote_key,
            size_bytes = bytes.len(),
            "Asset uploaded"
        );

        Ok(())
    }

    /// Best-effort removal of already uploaded objects; failures are logged, not returned
    pub async fn discard(&self, remote_keys: &[String]) {
        for key in remote_keys {
            match self.blob_repo.delete(key).await {
                Ok(()) => tracing::info!(remote_key = %key, "Discarded uploaded asset"),
                Err(e) => tracing::warn!(
                    remote_key = %key,
                    error = %e,
                    "Failed to discard uploaded asset"
                ),
            }
        }
    }
}
