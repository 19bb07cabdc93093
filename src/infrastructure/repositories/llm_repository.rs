use async_trait::async_trait;
use serde_json::Value;

/// JSON schema the model output has to follow
#[derive(Debug, Clone, PartialEq)]
pub struct OutputSchema {
    pub name: &'static str,
    pub schema: Value,
}

/// Repository for structured text generation.
#[async_trait]
pub trait LlmRepository: Send + Sync {
    /// Ask the model for a JSON object matching `schema`
    ///
    /// Returns the raw JSON text. Decoding and shape checks belong to the caller.
    async fn generate_object(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, String>;
}
