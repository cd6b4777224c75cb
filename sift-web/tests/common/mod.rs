#![allow(dead_code)]

use async_trait::async_trait;
use sift_common::{Result, SiftError};
use sift_llm::traits::{GenerateOptions, LlmClient, LlmResponse, ResponseFormat};
use std::sync::{Arc, Mutex};

/// Model stand-in that replays a canned reply and remembers what it was asked.
pub struct StubLlm {
    reply: std::result::Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
    pub formats: Mutex<Vec<ResponseFormat>>,
}

impl StubLlm {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
            formats: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
            formats: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    pub fn last_prompt(&self) -> String {
        self.prompts.lock().unwrap().last().cloned().unwrap_or_default()
    }
}

#[async_trait]
impl LlmClient for StubLlm {
    async fn generate(&self, prompt: &str, opts: &GenerateOptions<'_>) -> Result<LlmResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.formats.lock().unwrap().push(opts.response_format);
        match &self.reply {
            Ok(text) => Ok(LlmResponse {
                text: text.clone(),
                model: Some("stub".into()),
                tokens_used: None,
            }),
            Err(msg) => Err(SiftError::Model(msg.clone())),
        }
    }

    fn model_name(&self) -> &str {
        "stub"
    }
}
