//! Configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys, e.g.
//! `APP_RETRIEVAL__TOP_K=8`). Provides helpers to expand `~` and `${VAR}` and
//! to resolve relative paths against a known base directory.
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};

/// Marker strings stripped from generated text unless configured otherwise.
pub const DEFAULT_ARTIFACT_MARKERS: &[&str] = &[
    "<think>",
    "</think>",
    "<start_of_turn>",
    "<end_of_turn>",
    "<bos>",
    "<eos>",
    "<|im_start|>",
    "<|im_end|>",
    "<|endoftext|>",
    "<|begin_of_text|>",
    "<|eot_id|>",
    "<|start_header_id|>",
    "<|end_header_id|>",
];

pub const DEFAULT_PROMPT_TEMPLATE: &str = "Answer the question using only the context below. \
If the context does not contain the answer, say so.\n\n\
Context:\n{context}\n\nQuestion: {question}\n\nAnswer:";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmbeddingProvider {
    /// Deterministic feature hashing; no model files or network needed.
    Hashing,
    /// Local BGE-M3 weights run through candle.
    BgeM3,
    /// Any OpenAI-compatible `/embeddings` endpoint.
    Openai,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmbeddingSettings {
    pub provider: EmbeddingProvider,
    pub dim: usize,
    pub max_len: usize,
    pub batch_size: usize,
    pub model: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_dir: Option<String>,
    pub base_url: String,
    pub api_key_env: String,
    pub timeout_secs: u64,
    pub show_progress: bool,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Hashing,
            dim: 384,
            max_len: 256,
            batch_size: 32,
            model: "text-embedding-3-small".to_string(),
            model_dir: None,
            base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            timeout_secs: 60,
            show_progress: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetrievalSettings {
    pub top_k: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self { Self { top_k: 4 } }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationSettings {
    pub base_url: String,
    pub model: String,
    pub api_key_env: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub system_prompt: String,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            temperature: 0.2,
            max_tokens: 512,
            timeout_secs: 120,
            system_prompt: "You answer questions about a document.".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSettings {
    /// Must contain `{question}`; `{context}` is replaced by the retrieved chunks.
    pub prompt_template: String,
    /// Literal strings removed from model output.
    pub artifact_markers: Vec<String>,
    /// Regular expressions whose matches are removed from model output.
    pub artifact_patterns: Vec<String>,
}

impl Default for AnswerSettings {
    fn default() -> Self {
        Self {
            prompt_template: DEFAULT_PROMPT_TEMPLATE.to_string(),
            artifact_markers: DEFAULT_ARTIFACT_MARKERS.iter().map(|m| (*m).to_string()).collect(),
            artifact_patterns: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub chunking: ChunkingConfig,
    pub embedding: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
    pub generation: GenerationSettings,
    pub answer: AnswerSettings,
}

impl Settings {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::invalid_config("retrieval.top_k must be greater than 0"));
        }
        if self.embedding.dim == 0 || self.embedding.batch_size == 0 {
            return Err(Error::invalid_config("embedding.dim and embedding.batch_size must be greater than 0"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(Error::invalid_config(format!(
                "generation.temperature must be within 0.0..=2.0, got {}",
                self.generation.temperature
            )));
        }
        if !self.answer.prompt_template.contains("{question}") {
            return Err(Error::invalid_config("answer.prompt_template must contain {question}"));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());
        Self::load_for_env(&env_name)
    }

    pub fn load_for_env(env_name: &str) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default())).merge(Toml::file("config.toml"));
        match env_name {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));
        Ok(Self { figment })
    }

    /// Defaults only; ignores files and the environment.
    pub fn defaults() -> Self {
        Self { figment: Figment::from(Serialized::defaults(Settings::default())) }
    }

    /// Layer an extra provider on top, e.g. CLI overrides.
    #[must_use]
    pub fn merge<P: figment::Provider>(self, provider: P) -> Self {
        Self { figment: self.figment.merge(provider) }
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::invalid_config(format!("Failed to get '{key}': {e}")))
    }

    /// Extract and validate the full settings tree.
    pub fn settings(&self) -> Result<Settings> {
        let settings: Settings = self
            .figment
            .extract()
            .map_err(|e| Error::invalid_config(format!("Failed to extract settings: {e}")))?;
        settings.validate()?;
        Ok(settings)
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
