//! Provider‑agnostic language model integration for sift.
//!
//! This crate exposes a common [`traits::LlmClient`] interface and two
//! concrete providers: OpenAI Chat Completions (or any compatible gateway)
//! and a local Ollama server. [`build_llm_client`] turns a
//! [`sift_common::LlmConfig`] into a shared client.
//!
//! # Examples
//! ```
//! use sift_common::LlmConfig;
//! use sift_llm::build_llm_client;
//!
//! let client = build_llm_client(&LlmConfig::default()).unwrap();
//! assert_eq!(client.model_name(), "gpt-4o-mini");
//! ```
pub mod ollama;
pub mod openai;
pub mod traits;

use ollama::OllamaClient;
use openai::OpenAiClient;
use sift_common::LlmConfig;
use std::sync::Arc;
use std::time::Duration;
use traits::LlmClient;

pub use traits::{GenerateOptions, LlmResponse, ResponseFormat};

/// Build the configured provider. Nothing is contacted here; credentials and
/// reachability are only checked when a request is made.
pub fn build_llm_client(
    config: &LlmConfig,
) -> sift_common::Result<Arc<dyn LlmClient + Send + Sync + 'static>> {
    tracing::info!(
        provider = config.provider_name(),
        model = config.model(),
        "llm.client.build"
    );
    match config {
        LlmConfig::Openai {
            model,
            auth_token,
            endpoint,
            temperature,
            max_tokens,
            timeout_secs,
        } => {
            let mut client = OpenAiClient::with_endpoint(auth_token.clone(), model.clone(), endpoint)?
                .with_sampling(*temperature, *max_tokens);
            if let Some(secs) = timeout_secs {
                client = client.with_timeout(Duration::from_secs(*secs));
            }
            Ok(Arc::new(client))
        }
        LlmConfig::Ollama {
            model,
            endpoint,
            temperature,
            max_tokens,
            timeout_secs,
        } => {
            let mut client = OllamaClient::new(endpoint.clone(), model.clone())?
                .with_sampling(*temperature, *max_tokens);
            if let Some(secs) = timeout_secs {
                client = client.with_timeout(Duration::from_secs(*secs));
            }
            Ok(Arc::new(client))
        }
    }
}
