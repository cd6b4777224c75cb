//! Loader for sift configuration with YAML + environment overlays.
//!
//! File sources are merged in the order they are attached, later ones
//! winning, and `SIFT__`-prefixed environment variables are applied on top
//! of all of them. Nested keys
//! use `__` as the separator, so `SIFT__SCRAPE__STRATEGY=selector` sets
//! `scrape.strategy`. `llm.provider` defaults to `openai`, so
//! `SIFT__LLM__MODEL` alone is a valid override. After merging, every string value has `${VAR}`
//! references expanded from the process environment.
//!
//! Every section is optional; an empty configuration yields OpenAI with
//! `gpt-4o-mini`, the text strategy and a 130 column wrap.
//!
//! ```yaml
//! version: "1"
//! llm:
//!   provider: openai          # or: ollama
//!   model: gpt-4o-mini
//!   auth_token: ${OPENAI_API_KEY}
//! scrape:
//!   strategy: text            # or: selector
//!   wrap_width: 130
//!   fetch_timeout_secs: 30
//! logging:
//!   format: text              # or: json
//!   filter: info
//! ```
use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use sift_common::observability::{LogConfig, LogFormat};
use sift_common::{ExtractionStrategy, LlmConfig};
use std::path::{Path, PathBuf};

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

/// Column width used when flattening a page to plain text.
pub const DEFAULT_WRAP_WIDTH: usize = 130;

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct SiftConfig {
    #[serde(deserialize_with = "version_string")]
    pub version: Option<String>,
    pub llm: LlmConfig,
    pub scrape: ScrapeSettings,
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ScrapeSettings {
    pub strategy: ExtractionStrategy,
    pub wrap_width: usize,
    /// No fetch timeout unless set.
    pub fetch_timeout_secs: Option<u64>,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            strategy: ExtractionStrategy::TextBased,
            wrap_width: DEFAULT_WRAP_WIDTH,
            fetch_timeout_secs: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingSettings {
    pub format: LogFormat,
    pub filter: String,
    pub dir: Option<PathBuf>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            format: LogFormat::Text,
            filter: "info".into(),
            dir: None,
        }
    }
}

impl LoggingSettings {
    /// Logging for a full-screen binary: file sink only, stderr belongs to the terminal UI.
    pub fn to_log_config(&self, app_name: &str) -> LogConfig {
        LogConfig {
            app_name: app_name.to_string(),
            log_dir: self.dir.clone(),
            emit_stderr: false,
            format: self.format,
            default_filter: self.filter.clone(),
        }
    }
}

// YAML happily reads `version: 1.0` as a number.
fn version_string<'de, D>(de: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<Value>::deserialize(de)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn expand_env_in_value(v: &mut Value) {
    match v {
        Value::String(s) => {
            if s.contains('$') {
                let mut cur = std::mem::take(s);
                for _ in 0..MAXIMUM_ENV_EXPANSION_DEPTH {
                    let expanded = match shellexpand::env(&cur) {
                        Ok(cow) => cow.into_owned(),
                        Err(_) => cur.clone(),
                    };
                    if expanded == cur {
                        break;
                    }
                    cur = expanded;
                }
                *s = cur;
            }
        }
        Value::Array(arr) => arr.iter_mut().for_each(expand_env_in_value),
        Value::Object(obj) => obj.values_mut().for_each(expand_env_in_value),
        _ => {}
    }
}

const ENV_PREFIX: &str = "SIFT";

/// Builder hides the `config` crate wiring (YAML + env overrides).
pub struct SiftConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
}

impl Default for SiftConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl SiftConfigLoader {
    /// Start empty; `SIFT__` env overrides are layered on in [`Self::load`].
    ///
    /// ```
    /// use sift_config::SiftConfigLoader;
    /// use sift_common::ExtractionStrategy;
    ///
    /// let config = SiftConfigLoader::new()
    ///     .with_yaml_str("version: '1'\nscrape:\n  strategy: selector")
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.version.as_deref(), Some("1"));
    /// assert_eq!(config.scrape.strategy, ExtractionStrategy::SelectorBased);
    /// assert_eq!(config.scrape.wrap_width, 130);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
        }
    }

    /// Attach a YAML/TOML/JSON file that must exist; format is inferred from the suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Attach a file that is silently skipped when absent.
    pub fn with_optional_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self
            .builder
            .add_source(File::from(path.as_ref()).required(false));
        self
    }

    /// Merge an inline YAML snippet.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Consume the builder and deserialize the merged sources, env last.
    ///
    /// ```
    /// use sift_common::LlmConfig;
    /// use sift_config::SiftConfigLoader;
    ///
    /// unsafe { std::env::set_var("SIFT_DOC_TOKEN", "injected-from-env"); }
    ///
    /// let config = SiftConfigLoader::new()
    ///     .with_yaml_str(r#"
    /// llm:
    ///   provider: openai
    ///   model: gpt-4o
    ///   auth_token: "${SIFT_DOC_TOKEN}"
    /// "#)
    ///     .load()
    ///     .expect("valid configuration");
    ///
    /// match &config.llm {
    ///     LlmConfig::Openai { model, auth_token, endpoint, .. } => {
    ///         assert_eq!(model, "gpt-4o");
    ///         assert_eq!(auth_token, "injected-from-env");
    ///         assert_eq!(endpoint, "https://api.openai.com/v1");
    ///     }
    ///     _ => panic!("expected OpenAI configuration"),
    /// }
    ///
    /// unsafe { std::env::remove_var("SIFT_DOC_TOKEN"); }
    /// ```
    pub fn load(self) -> Result<SiftConfig, ConfigError> {
        let cfg = self
            .builder
            .set_default("llm.provider", "openai")?
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: SiftConfig =
            serde_json::from_value(v).map_err(|e| ConfigError::Message(e.to_string()))?;

        if typed.scrape.wrap_width == 0 {
            return Err(ConfigError::Message(
                "scrape.wrap_width must be greater than zero".into(),
            ));
        }

        Ok(typed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn expands_simple_string() {
        temp_env::with_var("FOO", Some("bar"), || {
            let mut v = json!("prefix-${FOO}-suffix");
            expand_env_in_value(&mut v);
            assert_eq!(v, json!("prefix-bar-suffix"));
        });
    }

    #[test]
    fn expands_in_array_and_object() {
        temp_env::with_vars([("CITY", Some("Winston")), ("STATE", Some("NC"))], || {
            let mut v = json!(["hello-$CITY", { "loc": "${CITY}-${STATE}" }, 42, true, null]);
            expand_env_in_value(&mut v);
            assert_eq!(
                v,
                json!(["hello-Winston", { "loc": "Winston-NC" }, 42, true, null])
            );
        });
    }

    #[test]
    fn expands_recursively_across_env_values() {
        temp_env::with_vars(
            [
                ("BAZ", Some("qux")),
                ("BAR", Some("mid-${BAZ}")),
                ("FOO", Some("start-${BAR}-end")),
            ],
            || {
                let mut v = json!("X=${FOO}");
                expand_env_in_value(&mut v);
                assert_eq!(v, json!("X=start-mid-qux-end"));
            },
        );
    }

    #[test]
    fn stops_on_cycles() {
        temp_env::with_vars([("A", Some("${B}")), ("B", Some("${A}"))], || {
            let mut v = json!("x=${A}-y");
            expand_env_in_value(&mut v);
            let s = v.as_str().unwrap();
            assert!(s.starts_with("x=") && s.ends_with("-y"));
            assert!(s.contains("${"));
        });
    }

    #[test]
    fn unknown_vars_are_left_as_is() {
        let mut v = json!("hi-${DOES_NOT_EXIST}");
        expand_env_in_value(&mut v);
        assert_eq!(v, json!("hi-${DOES_NOT_EXIST}"));
    }

    #[test]
    fn numeric_version_is_kept_as_text() {
        let cfg = SiftConfigLoader::new()
            .with_yaml_str("version: 2")
            .load()
            .unwrap();
        assert_eq!(cfg.version.as_deref(), Some("2"));
    }

    #[test]
    fn zero_wrap_width_is_rejected() {
        let err = SiftConfigLoader::new()
            .with_yaml_str("scrape:\n  wrap_width: 0")
            .load()
            .unwrap_err();
        assert!(err.to_string().contains("wrap_width"));
    }

    #[test]
    fn logging_settings_never_write_to_stderr() {
        let settings = LoggingSettings {
            format: LogFormat::Json,
            filter: "debug".into(),
            dir: Some(PathBuf::from("/tmp/sift-logs")),
        };
        let lc = settings.to_log_config("sift");
        assert!(!lc.emit_stderr);
        assert_eq!(lc.format, LogFormat::Json);
        assert_eq!(lc.default_filter, "debug");
        assert_eq!(lc.log_dir.as_deref(), Some(Path::new("/tmp/sift-logs")));
    }
}
