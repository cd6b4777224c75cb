use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sift_common::Result;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub model: Option<String>,
    pub tokens_used: Option<u32>,
}

/// Shape the provider is asked to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ResponseFormat {
    #[default]
    Text,
    /// A single JSON object (OpenAI `json_object`, Ollama `format: "json"`).
    JsonObject,
}

/// Knobs for a single generation call. Unset values defer to the client's defaults.
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions<'a> {
    pub system_prompt: Option<&'a str>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    pub response_format: ResponseFormat,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion for a single user prompt.
    async fn generate(&self, prompt: &str, opts: &GenerateOptions<'_>) -> Result<LlmResponse>;

    /// Get the model name being used
    fn model_name(&self) -> &str;

    /// One user message, reply forced to a single JSON object.
    ///
    /// The reply text is returned unparsed; callers decide how to treat
    /// malformed JSON.
    async fn generate_json(&self, prompt: &str) -> Result<LlmResponse> {
        let opts = GenerateOptions {
            response_format: ResponseFormat::JsonObject,
            ..Default::default()
        };
        tracing::debug!(model = self.model_name(), prompt_len = prompt.len(), "llm.generate_json");
        self.generate(prompt, &opts).await
    }
}
