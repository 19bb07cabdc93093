use super::llm_repository::{LlmRepository, OutputSchema};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestSystemMessageArgs, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, ResponseFormat, ResponseFormatJsonSchema,
    },
    Client,
};
use async_trait::async_trait;
use std::sync::Arc;

/// OpenAI chat completions with a strict JSON-schema response format
pub struct OpenAiLlmRepository {
    client: Arc<Client<OpenAIConfig>>,
    model: String,
}

impl OpenAiLlmRepository {
    pub fn new(client: Arc<Client<OpenAIConfig>>, model: String) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl LlmRepository for OpenAiLlmRepository {
    async fn generate_object(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        schema: &OutputSchema,
    ) -> Result<String, String> {
        let start_time = std::time::Instant::now();

        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages([
                ChatCompletionRequestSystemMessageArgs::default()
                    .content(system_prompt)
                    .build()
                    .map_err(|e| format!("Invalid system message: {}", e))?
                    .into(),
                ChatCompletionRequestUserMessageArgs::default()
                    .content(user_prompt)
                    .build()
                    .map_err(|e| format!("Invalid user message: {}", e))?
                    .into(),
            ])
            .response_format(ResponseFormat::JsonSchema {
                json_schema: ResponseFormatJsonSchema {
                    description: None,
                    name: schema.name.to_string(),
                    schema: Some(schema.schema.clone()),
                    strict: Some(true),
                },
            })
            .build()
            .map_err(|e| format!("Invalid chat completion request: {}", e))?;

        tracing::info!(
            model = %self.model,
            schema = schema.name,
            user_prompt_length = user_prompt.len(),
            "Calling OpenAI chat completion"
        );

        let response = self.client.chat().create(request).await.map_err(|e| {
            tracing::error!(
                error = %e,
                model = %self.model,
                schema = schema.name,
                "OpenAI chat completion failed"
            );
            format!("OpenAI error: {}", e)
        })?;

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| "OpenAI returned no content".to_string())?;

        tracing::info!(
            provider = "openai",
            model = %self.model,
            schema = schema.name,
            latency_ms = start_time.elapsed().as_millis(),
            content_length = content.len(),
            "Structured generation completed"
        );

        Ok(content)
    }
}
