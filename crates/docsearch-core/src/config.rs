//! Layered configuration and path helpers.
//!
//! Uses Figment to merge compiled defaults, `config.toml`,
//! `config.<env>.toml` and `APP_*` env vars (`__` separates sections, e.g.
//! `APP_SEARCH__MAX_TOP_K=500`). Provides helpers to expand `~` and
//! `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::error::Error;

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_in(Path::new("."))
    }

    /// Load with config files looked up in `base`.
    pub fn load_in(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(AppConfig::default()))
            .merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.app()?.validate()?;
        Ok(config)
    }

    pub fn from_figment(figment: Figment) -> Self { Self { figment } }

    /// The whole typed configuration.
    pub fn app(&self) -> anyhow::Result<AppConfig> {
        self.figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract configuration: {}", e))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub index: IndexConfig,
    pub models: ModelsConfig,
    pub search: SearchConfig,
    pub rerank: RerankConfig,
    pub expansion: ExpansionConfig,
    pub summary: SummaryConfig,
    pub generate: GenerateConfig,
    pub indexing: IndexingConfig,
}

impl AppConfig {
    pub fn validate(&self) -> crate::error::Result<()> {
        let s = &self.search;
        if s.max_top_k == 0 {
            return Err(Error::InvalidConfig("search.max_top_k must be >= 1".into()));
        }
        if !(s.title_weight >= s.body_weight && s.body_weight >= s.expanded_weight && s.expanded_weight > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "field weights must satisfy title >= body >= expanded_text > 0 (got {}, {}, {})",
                s.title_weight, s.body_weight, s.expanded_weight
            )));
        }
        if self.indexing.batch_size == 0 {
            return Err(Error::InvalidConfig("indexing.batch_size must be >= 1".into()));
        }
        if self.rerank.batch_size == 0 {
            return Err(Error::InvalidConfig("rerank.batch_size must be >= 1".into()));
        }
        if self.generate.min_temperature > self.generate.max_temperature {
            return Err(Error::InvalidConfig("generate.min_temperature exceeds max_temperature".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    pub dir: String,
}

impl Default for IndexConfig {
    fn default() -> Self { Self { dir: "data/index".into() } }
}

impl IndexConfig {
    pub fn dir_path(&self) -> PathBuf { expand_path(&self.dir) }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelsConfig {
    /// Root holding one subdirectory per model.
    pub dir: String,
    pub expander: String,
    pub reranker: String,
    pub generator: String,
    /// Use deterministic fake models instead of loading weights.
    pub use_fake: bool,
    pub seed: u64,
}

impl Default for ModelsConfig {
    fn default() -> Self {
        Self {
            dir: "models".into(),
            expander: "doc2query-t5-base-msmarco".into(),
            reranker: "ms-marco-MiniLM-L-6-v2".into(),
            generator: "Qwen2.5-0.5B-Instruct".into(),
            use_fake: false,
            seed: 42,
        }
    }
}

impl ModelsConfig {
    pub fn model_path(&self, name: &str) -> PathBuf {
        resolve_with_base(&expand_path(&self.dir), name)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_top_k: usize,
    pub default_top_k: usize,
    pub excerpt_chars: usize,
    pub title_weight: f32,
    pub body_weight: f32,
    pub expanded_weight: f32,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_top_k: 1000,
            default_top_k: 10,
            excerpt_chars: crate::types::EXCERPT_CHARS,
            title_weight: 3.0,
            body_weight: 1.0,
            expanded_weight: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RerankConfig {
    pub body_prefix_chars: usize,
    pub batch_size: usize,
    pub max_tokens: usize,
}

impl Default for RerankConfig {
    fn default() -> Self { Self { body_prefix_chars: 300, batch_size: 32, max_tokens: 512 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExpansionConfig {
    pub enabled: bool,
    pub num_queries: usize,
    pub temperature: f64,
    pub top_k: usize,
    pub max_input_tokens: usize,
    pub max_query_tokens: usize,
    pub no_repeat_ngram_size: usize,
}

impl Default for ExpansionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            num_queries: 5,
            temperature: 0.7,
            top_k: 10,
            max_input_tokens: 512,
            max_query_tokens: 64,
            no_repeat_ngram_size: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryConfig {
    pub temperature: f64,
    pub max_new_tokens: usize,
}

impl Default for SummaryConfig {
    fn default() -> Self { Self { temperature: 0.2, max_new_tokens: 180 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub default_max_length: usize,
    pub default_temperature: f64,
    pub max_length_limit: usize,
    pub min_temperature: f64,
    pub max_temperature: f64,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            default_max_length: 512,
            default_temperature: 0.7,
            max_length_limit: 2048,
            min_temperature: 0.1,
            max_temperature: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexingConfig {
    pub batch_size: usize,
}

impl Default for IndexingConfig {
    fn default() -> Self { Self { batch_size: 100 } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}
