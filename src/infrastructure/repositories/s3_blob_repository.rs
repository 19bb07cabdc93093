use super::blob_repository::BlobRepository;
use async_trait::async_trait;
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use std::path::Path;
use std::sync::Arc;

/// S3 implementation of blob storage
pub struct S3BlobRepository {
    s3_client: Arc<S3Client>,
    bucket: String,
}

impl S3BlobRepository {
    pub fn new(s3_client: Arc<S3Client>, bucket: String) -> Self {
        Self { s3_client, bucket }
    }
}

fn content_type_for(key: &str) -> &'static str {
    match key.rsplit('.').next() {
        Some("mp3") => "audio/mpeg",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl BlobRepository for S3BlobRepository {
    async fn upload(&self, local_path: &Path, remote_key: &str) -> Result<(), String> {
        let body = ByteStream::from_path(local_path).await.map_err(|e| {
            format!("Failed to open {}: {}", local_path.display(), e)
        })?;

        self.s3_client
            .put_object()
            .bucket(&self.bucket)
            .key(remote_key)
            .content_type(content_type_for(remote_key))
            .body(body)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    bucket = %self.bucket,
                    key = remote_key,
                    "S3 put_object failed"
                );
                format!("S3 upload error: {}", e)
            })?;

        tracing::info!(bucket = %self.bucket, key = remote_key, "Object uploaded");
        Ok(())
    }

    async fn delete(&self, remote_key: &str) -> Result<(), String> {
        self.s3_client
            .delete_object()
            .bucket(&self.bucket)
            .key(remote_key)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = ?e,
                    bucket = %self.bucket,
                    key = remote_key,
                    "S3 delete_object failed"
                );
                format!("S3 delete error: {}", e)
            })?;

        tracing::info!(bucket = %self.bucket, key = remote_key, "Object deleted");
        Ok(())
    }
}
