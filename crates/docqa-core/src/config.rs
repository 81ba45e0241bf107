//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge compiled defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys). Provides helpers to expand
//! `~` and `${VAR}` and to resolve relative paths against a known base directory.

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
    /// Load from the current working directory.
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(dir.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(dir.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(dir.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(dir.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment };
        config.settings()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Typed view over every section, validated.
    pub fn settings(&self) -> anyhow::Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| anyhow::anyhow!("Failed to extract settings: {}", e))?;
        settings.validate()?;
        Ok(settings)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub storage: StorageSettings,
    pub chunking: ChunkingSettings,
    pub retrieval: RetrievalSettings,
    pub answer: AnswerSettings,
    pub models: ModelSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<(), Error> {
        let c = &self.chunking;
        if c.target_tokens == 0 || c.max_chars == 0 {
            return Err(Error::InvalidConfig("chunking.target_tokens and chunking.max_chars must be > 0".into()));
        }
        let r = &self.retrieval;
        if r.mmr_top == 0 || r.rerank_top == 0 {
            return Err(Error::InvalidConfig("retrieval.mmr_top and retrieval.rerank_top must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&r.mmr_lambda) {
            return Err(Error::InvalidConfig(format!("retrieval.mmr_lambda must be within [0, 1], got {}", r.mmr_lambda)));
        }
        if r.rrf_k < 0.0 {
            return Err(Error::InvalidConfig(format!("retrieval.rrf_k must be >= 0, got {}", r.rrf_k)));
        }
        if self.storage.text_cap == 0 {
            return Err(Error::InvalidConfig("storage.text_cap must be > 0".into()));
        }
        if self.answer.word_budget == 0 {
            return Err(Error::InvalidConfig("answer.word_budget must be > 0".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub index_dir: String,
    /// Cap (in chars) applied to each record's `text` before it is persisted.
    pub text_cap: usize,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self { index_dir: "./data/index".to_string(), text_cap: 1500 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingSettings {
    pub target_tokens: usize,
    pub overlap_tokens: usize,
    pub max_chars: usize,
}

impl Default for ChunkingSettings {
    fn default() -> Self {
        Self { target_tokens: 180, overlap_tokens: 30, max_chars: 1500 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub vector_width: usize,
    pub lexical_width: usize,
    pub rrf_k: f32,
    pub mmr_top: usize,
    pub mmr_lambda: f32,
    pub rerank_top: usize,
    pub snippet_chars: usize,
    pub default_top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            vector_width: 24,
            lexical_width: 50,
            rrf_k: 60.0,
            mmr_top: 8,
            mmr_lambda: 0.7,
            rerank_top: 3,
            snippet_chars: 500,
            default_top_k: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnswerSettings {
    pub max_contexts: usize,
    pub sentences_per_context: usize,
    pub word_budget: usize,
    pub min_overlap_tokens: usize,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self { max_contexts: 2, sentences_per_context: 2, word_budget: 60, min_overlap_tokens: 2 }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub embedding_dir: Option<String>,
    pub reranker_dir: Option<String>,
    /// Use the deterministic hash embedder and overlap reranker.
    pub use_fake: bool,
    pub fake_dim: usize,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self { embedding_dir: None, reranker_dir: None, use_fake: false, fake_dim: 384 }
    }
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
