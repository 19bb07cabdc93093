use async_trait::async_trait;
use std::path::Path;

/// Durable object storage for generated media.
#[async_trait]
pub trait BlobRepository: Send + Sync {
    /// Upload a local file under `remote_key`, replacing any previous object
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<(), String>;

    /// Remove the object under `remote_key`; a missing object is not an error
    async fn delete(&self, remote_key: &str) -> Result<(), String>;
}
