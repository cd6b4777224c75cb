use crate::traits::{GenerateOptions, LlmClient, LlmResponse, ResponseFormat};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sift_common::{Result, SiftError, OPENAI_API_KEY_ENV};
use sift_http::{HttpClient, HttpError};
use std::time::Duration;

/// Chat Completions client for OpenAI and OpenAI-compatible gateways.
pub struct OpenAiClient {
    client: HttpClient,
    api_key: String,
    model: String,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

#[derive(Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormatWire>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Serialize)]
struct ResponseFormatWire {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    total_tokens: Option<u32>,
}

impl OpenAiClient {
    /// Create a client for any OpenAI-compatible base URL (`.../v1`).
    pub fn with_endpoint(api_key: String, model: String, endpoint: &str) -> Result<Self> {
        let base = if endpoint.ends_with('/') {
            endpoint.to_string()
        } else {
            format!("{endpoint}/")
        };
        let client = HttpClient::new(&base)
            .map_err(|e| SiftError::Config(format!("HttpClient init failed: {e}")))?;

        Ok(Self {
            client,
            api_key,
            model,
            temperature: None,
            max_tokens: None,
        })
    }

    /// Defaults applied when a call leaves temperature/max_tokens unset.
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.client = self.client.with_timeout(timeout);
        self
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    async fn generate(&self, prompt: &str, opts: &GenerateOptions<'_>) -> Result<LlmResponse> {
        if self.api_key.trim().is_empty() {
            return Err(SiftError::Model(format!(
                "no OpenAI API key configured (set {OPENAI_API_KEY_ENV})"
            )));
        }

        let mut messages = Vec::with_capacity(2);
        if let Some(system) = opts.system_prompt {
            messages.push(ChatMessage {
                role: "system",
                content: system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: prompt,
        });

        let req = ChatCompletionRequest {
            model: &self.model,
            messages,
            temperature: opts.temperature.or(self.temperature),
            max_tokens: opts.max_tokens.or(self.max_tokens),
            response_format: match opts.response_format {
                ResponseFormat::JsonObject => Some(ResponseFormatWire {
                    kind: "json_object",
                }),
                ResponseFormat::Text => None,
            },
        };

        let resp: ChatCompletionResponse = self
            .client
            .post_json("chat/completions", Some(&self.api_key), &req)
            .await
            .map_err(http_to_sift)?;

        let choice = resp
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| SiftError::Model("completion has no choices".into()))?;
        // A null content (refusal, filtered output) reads as an empty reply.
        let text = choice.message.content.unwrap_or_default();

        tracing::debug!(model = ?resp.model, reply_len = text.len(), "openai.completion");

        Ok(LlmResponse {
            text,
            model: resp.model,
            tokens_used: resp.usage.and_then(|u| u.total_tokens),
        })
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

fn http_to_sift(e: HttpError) -> SiftError {
    SiftError::Model(e.to_string())
}
