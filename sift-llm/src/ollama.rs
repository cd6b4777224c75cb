use crate::traits::{GenerateOptions, LlmClient, LlmResponse, ResponseFormat};
use async_trait::async_trait;
use serde_json::{json, Value as JsonValue};
use sift_common::{Result, SiftError};
use std::time::Duration;

/// Ollama client for local model inference.
///
/// The server is not contacted until the first request, so a stopped
/// server surfaces as a request failure rather than a startup failure.
pub struct OllamaClient {
    client: reqwest::Client,
    base_url: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
    timeout: Option<Duration>,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String) -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| SiftError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
            temperature: None,
            max_tokens: None,
            timeout: None,
        })
    }

    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

#[async_trait]
impl LlmClient for OllamaClient {
    async fn generate(&self, prompt: &str, opts: &GenerateOptions<'_>) -> Result<LlmResponse> {
        let url = format!("{}/api/generate", self.base_url);

        let mut options = serde_json::Map::new();
        if let Some(temp) = opts.temperature.or(self.temperature) {
            options.insert("temperature".to_string(), json!(temp));
        }
        if let Some(max_tok) = opts.max_tokens.or(self.max_tokens) {
            options.insert("num_predict".to_string(), json!(max_tok));
        }

        let mut payload = json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": options
        });
        if let Some(system) = opts.system_prompt {
            payload["system"] = json!(system);
        }
        if opts.response_format == ResponseFormat::JsonObject {
            payload["format"] = json!("json");
        }

        let mut req = self.client.post(&url).json(&payload);
        if let Some(t) = self.timeout {
            req = req.timeout(t);
        }
        let resp = req
            .send()
            .await
            .map_err(|e| SiftError::Model(format!("Generate request failed: {}", e)))?;

        if !resp.status().is_success() {
            return Err(SiftError::Model(format!(
                "Generate failed: HTTP {}",
                resp.status()
            )));
        }

        let val: JsonValue = resp
            .json()
            .await
            .map_err(|e| SiftError::Model(format!("Failed to parse response: {}", e)))?;

        let text = val
            .get("response")
            .and_then(|r| r.as_str())
            .unwrap_or("")
            .to_string();

        let tokens_used = val
            .get("eval_count")
            .and_then(|c| c.as_u64())
            .map(|c| c as u32);

        Ok(LlmResponse {
            text,
            model: Some(self.model.clone()),
            tokens_used,
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
