//! Common types and utilities shared across the sift crates.
//!
//! This crate defines the provider configuration, observability helpers and
//! the shared error type used throughout the workspace. It stays small so
//! every other crate can depend on it without pulling in heavy transitive
//! dependencies.
//!
//! # Overview
//!
//! - [`LlmConfig`]: provider‑agnostic language model configuration
//! - [`ExtractionStrategy`]: text or selector based field extraction
//! - [`observability`]: centralised tracing/logging initialisation
//! - [`SiftError`] and [`Result`]: shared error handling
//! - [`NOT_FOUND`]: the sentinel written for fields that could not be located
//!
//! # Examples
//!
//! ```rust
//! use sift_common::{LlmConfig, DEFAULT_OPENAI_MODEL};
//!
//! let cfg = LlmConfig::default();
//! assert_eq!(cfg.model(), DEFAULT_OPENAI_MODEL);
//! ```
use serde::{Deserialize, Serialize};

pub mod observability;

/// Value stored for a field that the extractor could not locate on the page.
pub const NOT_FOUND: &str = "Not found";

/// Fixed message surfaced to callers whenever a scrape fails, whatever the cause.
pub const SCRAPE_FAILED: &str = "Failed to scrape website";

pub const DEFAULT_OPENAI_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:3b";
pub const OPENAI_API_KEY_ENV: &str = "OPENAI_API_KEY";

/// How fields are pulled out of a page.
///
/// `text` sends the readable text to the model and takes its records as-is;
/// `selector` asks the model for a CSS selector per field and reads the DOM.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExtractionStrategy {
    #[default]
    #[serde(rename = "text", alias = "text_based")]
    TextBased,
    #[serde(rename = "selector", alias = "selector_based")]
    SelectorBased,
}

impl ExtractionStrategy {
    pub fn label(self) -> &'static str {
        match self {
            Self::TextBased => "Text",
            Self::SelectorBased => "Selector",
        }
    }

    /// The other strategy; used by the form toggle.
    pub fn toggled(self) -> Self {
        match self {
            Self::TextBased => Self::SelectorBased,
            Self::SelectorBased => Self::TextBased,
        }
    }
}

/// Configuration for the language model provider.
///
/// The tag is `provider`; every other key has a default so a bare
/// `provider: openai` is enough.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmConfig {
    Openai {
        #[serde(default = "default_openai_model")]
        model: String,
        /// Falls back to `$OPENAI_API_KEY`. An empty token is accepted here and
        /// only rejected when a request is actually made.
        #[serde(default = "default_openai_token")]
        auth_token: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
    Ollama {
        #[serde(default = "default_ollama_model")]
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
        #[serde(default)]
        timeout_secs: Option<u64>,
    },
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::Openai {
            model: default_openai_model(),
            auth_token: default_openai_token(),
            endpoint: default_openai_endpoint(),
            temperature: None,
            max_tokens: None,
            timeout_secs: None,
        }
    }
}

impl LlmConfig {
    pub fn model(&self) -> &str {
        match self {
            Self::Openai { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        match self {
            Self::Openai { .. } => "openai",
            Self::Ollama { .. } => "ollama",
        }
    }
}

fn default_openai_model() -> String {
    DEFAULT_OPENAI_MODEL.into()
}
fn default_ollama_model() -> String {
    DEFAULT_OLLAMA_MODEL.into()
}
fn default_openai_token() -> String {
    std::env::var(OPENAI_API_KEY_ENV).unwrap_or_default()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
}

/// Error types used across the sift workspace.
///
/// Callers of the scrape action never see these directly; they are logged and
/// collapsed into [`SCRAPE_FAILED`].
#[derive(thiserror::Error, Debug)]
pub enum SiftError {
    /// The target page could not be retrieved.
    #[error("Fetch error: {0}")]
    Fetch(String),

    /// The retrieved markup could not be processed.
    #[error("Markup error: {0}")]
    Markup(String),

    /// The language model call failed (auth, quota, transport, bad envelope).
    #[error("Model error: {0}")]
    Model(String),

    /// Configuration was incomplete or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The request itself was unusable (no URL, no fields).
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

/// Convenient alias for results that use [`SiftError`].
pub type Result<T> = std::result::Result<T, SiftError>;
