use super::image_repository::ImageRepository;
use async_openai::{
    config::OpenAIConfig,
    types::{CreateImageRequestArgs, Image, ImageModel, ImageResponseFormat, ImageSize},
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI image generation; images are returned as short-lived URLs
pub struct OpenAiImageRepository {
    client: Arc<Client<OpenAIConfig>>,
    http: reqwest::Client,
    model: String,
}

impl OpenAiImageRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, http: reqwest::Client, model: String) -> Self {
        Self {
            client,
            http,
            model,
        }
    }

    fn image_model(&self) -> ImageModel {
        match self.model.as_str() {
            "dall-e-2" => ImageModel::DallE2,
            "dall-e-3" => ImageModel::DallE3,
            other => ImageModel::Other(other.to_string()),
        }
    }
}

#[async_trait]
impl ImageRepository for OpenAiImageRepository {
    async fn generate(&self, description: &str) -> Result<String, String> {
        let request = CreateImageRequestArgs::default()
            .prompt(description)
            .model(self.image_model())
            .n(1)
            .size(ImageSize::S1024x1024)
            .response_format(ImageResponseFormat::Url)
            .build()
            .map_err(|e| format!("Invalid image request: {}", e))?;

        tracing::info!(
            model = %self.model,
            description_length = description.len(),
            "Calling OpenAI image generation"
        );

        let response = self.client.images().create(request).await.map_err(|e| {
            tracing::error!(error = %e, model = %self.model, "OpenAI image generation failed");
            format!("OpenAI image error: {}", e)
        })?;

        response
            .data
            .iter()
            .find_map(|image| match image.as_ref() {
                Image::Url { url, .. } => Some(url.clone()),
                Image::B64Json { .. } => None,
            })
            .ok_or_else(|| "OpenAI returned no image URL".to_string())
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>, String> {
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| format!("Image download failed: {}", e))?;

        if !response.status().is_success() {
            return Err(format!("Image download failed: HTTP {}", response.status()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("Failed to read image body: {}", e))?;

        tracing::debug!(size_bytes = bytes.len(), "Image downloaded");
        Ok(bytes.to_vec())
    }
}
