use futures::FutureExt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

use crate::domain::shared::{AssetStager, GenerationError, GenerationStage, RetryPolicy, StageError};
use crate::infrastructure::repositories::ImageRepository;

const IMAGE_PREFIX: &str = "images";

pub struct ImageService {
    image_repo: Arc<dyn ImageRepository>,
    stager: Arc<AssetStager>,
    retry: RetryPolicy,
}

impl ImageService {
    pub fn new(
        image_repo: Arc<dyn ImageRepository>,
        stager: Arc<AssetStager>,
        retry: RetryPolicy,
    ) -> Self {
        Self {
            image_repo,
            stager,
            retry,
        }
    }

    pub fn image_key(content_id: &str) -> String {
        format!("{}/{}.png", IMAGE_PREFIX, content_id)
    }

    /// Generate a cover image and upload it as `images/{content_id}.png`.
    ///
    /// Generation and the download/stage/upload step are retried separately,
    /// so a failed upload never asks for a new image. Returns the storage key.
    pub async fn generate(
        &self,
        content_id: &str,
        description: &str,
        token: &CancellationToken,
    ) -> Result<String, StageError> {
        let url = self
            .retry
            .retry(GenerationStage::Image, token, || {
                async move {
                    self.image_repo
                        .generate(description)
                        .await
                        .map_err(GenerationError::Service)
                }
                .boxed()
            })
            .await?;

        let key = Self::image_key(content_id);
        let file_name = format!("{}.png", content_id);
        let (url, key_ref, file_name) = (&url, &key, &file_name);

        self.retry
            .retry(GenerationStage::Image, token, || {
                async move {
                    let bytes = self
                        .image_repo
                        .download(url)
                        .await
                        .map_err(GenerationError::Service)?;
                    self.stager.publish(file_name, &bytes, key_ref).await
                }
                .boxed()
            })
            .await?;

        tracing::info!(content_id = content_id, key = %key, "Image generated");
        Ok(key)
    }

    pub async fn discard(&self, key: &str) {
        self.stager.discard(&[key.to_string()]).await;
    }
}
