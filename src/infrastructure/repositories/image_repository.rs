use async_trait::async_trait;

/// Repository for image generation.
#[async_trait]
pub trait ImageRepository: Send + Sync {
    /// Generate one image for the description and return where it can be fetched
    async fn generate(&self, description: &str) -> Result<String, String>;

    /// Download a generated image
    async fn download(&self, url: &str) -> Result<Vec<u8>, String>;
}
