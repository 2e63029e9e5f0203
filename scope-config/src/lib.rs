//! Loader for workspace configuration with YAML + environment overlays.
//!
//! Precedence: `SCOPE_`-prefixed environment variables override file values,
//! and `${VAR}` placeholders inside string values are expanded recursively
//! (depth-capped) after the sources are merged. Validation happens in
//! [`ScopeConfig::validate`] so credential problems surface before any
//! network call.

use config::{Config, ConfigError, Environment, File};
use scope_common::{Depth, FocusArea, Intent, Recency, ScopeError, SearchMode};
use serde::Deserialize;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

const MAXIMUM_ENV_EXPANSION_DEPTH: usize = 8;

#[derive(Debug, Deserialize)]
pub struct ScopeConfig {
    pub version: Option<String>,
    pub search: SearchProviderConfig,
    pub llm: LlmProviderConfig,
    #[serde(default)]
    pub pipeline: PipelineConfig,
}

/// Credentials and endpoint for the web search provider.
#[derive(Debug, Deserialize)]
pub struct SearchProviderConfig {
    pub api_key: String,
    #[serde(default = "default_search_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_search_model")]
    pub model: String,
}

/// The tag is `provider`; each variant carries its own connection details.
#[derive(Debug, Deserialize)]
#[serde(tag = "provider", rename_all = "lowercase")]
pub enum LlmProviderConfig {
    Openai {
        model: String,
        api_key: String,
        #[serde(default = "default_openai_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
    Ollama {
        model: String,
        #[serde(default = "default_ollama_endpoint")]
        endpoint: String,
        #[serde(default)]
        temperature: Option<f32>,
        #[serde(default)]
        max_tokens: Option<u32>,
    },
}

/// Budgets, timeouts, and enumerated run options for the pipeline core.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub intent: Intent,
    pub mode: SearchMode,
    pub recency: Recency,
    pub depth: Depth,
    pub focus: FocusArea,
    pub budget_chars: usize,
    pub page_char_cap: usize,
    pub max_results: usize,
    pub fetch_timeout_secs: u64,
    pub synth_timeout_secs: u64,
    pub run_timeout_secs: u64,
    pub max_concurrency: usize,
    pub max_retries: usize,
    pub retry_base_ms: u64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            intent: Intent::Discover,
            mode: SearchMode::Web,
            recency: Recency::Week,
            depth: Depth::Standard,
            focus: FocusArea::Any,
            budget_chars: 12_000,
            page_char_cap: 6_000,
            max_results: 8,
            fetch_timeout_secs: 15,
            synth_timeout_secs: 80,
            run_timeout_secs: 120,
            max_concurrency: 4,
            max_retries: 3,
            retry_base_ms: 200,
        }
    }
}

impl PipelineConfig {
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }
    pub fn synth_timeout(&self) -> Duration {
        Duration::from_secs(self.synth_timeout_secs)
    }
    pub fn run_timeout(&self) -> Duration {
        Duration::from_secs(self.run_timeout_secs)
    }
    pub fn retry_base(&self) -> Duration {
        Duration::from_millis(self.retry_base_ms)
    }
}

impl ScopeConfig {
    /// Check credentials and numeric options before any network call.
    pub fn validate(&self) -> scope_common::Result<()> {
        check_secret("search.api_key", &self.search.api_key)?;
        match &self.llm {
            LlmProviderConfig::Openai { api_key, model, .. } => {
                check_secret("llm.api_key", api_key)?;
                check_nonempty("llm.model", model)?;
            }
            LlmProviderConfig::Ollama { model, .. } => {
                check_nonempty("llm.model", model)?;
            }
        }

        let p = &self.pipeline;
        if p.budget_chars == 0 {
            return Err(ScopeError::Config("pipeline.budget_chars must be > 0".into()));
        }
        if p.page_char_cap == 0 {
            return Err(ScopeError::Config("pipeline.page_char_cap must be > 0".into()));
        }
        if !(1..=8).contains(&p.max_results) {
            return Err(ScopeError::Config(
                "pipeline.max_results must be between 1 and 8".into(),
            ));
        }
        if p.max_concurrency == 0 {
            return Err(ScopeError::Config(
                "pipeline.max_concurrency must be >= 1".into(),
            ));
        }
        if p.max_retries == 0 {
            return Err(ScopeError::Config("pipeline.max_retries must be >= 1".into()));
        }
        Ok(())
    }
}

fn check_secret(field: &str, value: &str) -> scope_common::Result<()> {
    check_nonempty(field, value)?;
    // An unexpanded placeholder means the env var was never set.
    if value.contains("${") {
        return Err(ScopeError::Config(format!(
            "{field} still contains an unresolved ${{VAR}} placeholder"
        )));
    }
    Ok(())
}

fn check_nonempty(field: &str, value: &str) -> scope_common::Result<()> {
    if value.trim().is_empty() {
        return Err(ScopeError::Config(format!("{field} is missing or empty")));
    }
    Ok(())
}

fn default_search_endpoint() -> String {
    "https://api.perplexity.ai".into()
}
fn default_search_model() -> String {
    "sonar-pro".into()
}
fn default_openai_endpoint() -> String {
    "https://api.openai.com/v1".into()
}
fn default_ollama_endpoint() -> String {
    "http://localhost:11434".into()
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

/// Builder hides the `config` crate wiring (YAML + env overrides).
///
/// Precedence, lowest to highest: files and inline YAML in the order they
/// were added, then `SCOPE_*` environment variables, then override layers.
pub struct ScopeConfigLoader {
    builder: config::ConfigBuilder<config::builder::DefaultState>,
    overrides: Vec<String>,
}

impl Default for ScopeConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ScopeConfigLoader {
    /// Start with sensible defaults: YAML file + `SCOPE_` env overrides.
    ///
    /// ```
    /// use scope_config::ScopeConfigLoader;
    ///
    /// let config = ScopeConfigLoader::new()
    ///     .with_yaml_str(
    ///         r#"
    /// search:
    ///   api_key: "demo"
    /// llm:
    ///   provider: "openai"
    ///   model: "gpt-4o-mini"
    ///   api_key: "demo"
    /// "#,
    ///     )
    ///     .load()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.search.model, "sonar-pro");
    /// assert_eq!(config.pipeline.max_results, 8);
    /// ```
    pub fn new() -> Self {
        Self {
            builder: Config::builder(),
            overrides: Vec::new(),
        }
    }

    /// Attach a YAML/TOML/JSON file; the `config` crate infers format by suffix.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.builder = self.builder.add_source(File::from(path.as_ref()).required(true));
        self
    }

    /// Allow tests/CLI to merge inline YAML snippets.
    pub fn with_yaml_str(mut self, yaml: &str) -> Self {
        self.builder = self
            .builder
            .add_source(File::from_str(yaml, config::FileFormat::Yaml));
        self
    }

    /// Stash a YAML snippet that merges after the environment overlay, so
    /// explicit flags (CLI) beat both files and `SCOPE_*` variables.
    pub fn with_overrides_yaml(mut self, yaml: &str) -> Self {
        self.overrides.push(yaml.to_string());
        self
    }

    /// Consume the builder and deserialize the merged sources into strongly
    /// typed config, expanding `${VAR}` placeholders along the way.
    ///
    /// The environment overlay is merged here, after every file source, so
    /// `SCOPE_SEARCH__API_KEY` replaces `search.api_key` from the file.
    pub fn load(self) -> Result<ScopeConfig, ConfigError> {
        let mut builder = self.builder.add_source(
            Environment::with_prefix("SCOPE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );
        for yaml in &self.overrides {
            builder = builder.add_source(File::from_str(yaml, config::FileFormat::Yaml));
        }
        let cfg = builder.build()?;

        // Convert to serde_json::Value first so expansion can walk the tree.
        let mut v: Value = cfg.try_deserialize()?;
        expand_env_in_value(&mut v);

        let typed: ScopeConfig =
            serde_json::from_value(v).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        Ok(typed)
    }
}
