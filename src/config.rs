//! Configuration management for agentic-rag
//!
//! Provides TOML-based configuration with defaults, environment overrides
//! and validation.
//! Location: ~/.agentic-rag/config.toml

use crate::agent::{GraphConfig, DEFAULT_MAX_REWRITES};
use crate::errors::{RagError, Result};
use crate::models::client::{DEFAULT_CHAT_MODEL, DEFAULT_EMBEDDING_MODEL};
use crate::rag::retrieval::weaviate::{DEFAULT_INDEX, DEFAULT_TEXT_PROPERTY, DEFAULT_WEAVIATE_URL};
use crate::rag::retrieval::{QueryMode, RetrievalRequest, DEFAULT_ALPHA, DEFAULT_TOP_K};
use crate::rag::service::DEFAULT_DOCUMENTS_TOP_K;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Environment variable overriding the Ollama base URL
pub const ENV_OLLAMA_URL: &str = "AGENTIC_RAG_OLLAMA_URL";

/// Environment variable overriding the chat model
pub const ENV_CHAT_MODEL: &str = "AGENTIC_RAG_CHAT_MODEL";

/// Environment variable overriding the Weaviate URL
pub const ENV_WEAVIATE_URL: &str = "AGENTIC_RAG_WEAVIATE_URL";

/// Environment variable overriding the index name
pub const ENV_INDEX: &str = "AGENTIC_RAG_INDEX";

/// Complete configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub model: ModelConfig,
    pub retrieval: RetrievalConfig,
    pub graph: GraphSection,
    pub logging: LoggingConfig,
}

/// Ollama connection and model selection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub host: String,
    pub port: u16,

    /// Full base URL; takes precedence over `host`/`port` when set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    pub chat_model: String,
    pub embedding_model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
}

/// Retrieval backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetrievalBackend {
    Weaviate,
    Memory,
}

/// Retrieval defaults and backend settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub backend: RetrievalBackend,
    pub mode: QueryMode,
    pub top_k: usize,
    pub documents_top_k: usize,

    /// Sparse weight in hybrid mode
    pub alpha: f32,

    /// Embed queries client-side with the embedding model
    pub embed_queries: bool,

    pub weaviate_url: String,
    pub index: String,
    pub text_property: String,
    pub metadata_properties: Vec<String>,

    /// JSONL corpus for the memory backend
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corpus_path: Option<PathBuf>,
}

/// Graph behavior
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphSection {
    pub max_rewrites: usize,
}

/// Log output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter when `RUST_LOG` is unset
    pub level: String,
    pub json: bool,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            base_url: None,
            chat_model: DEFAULT_CHAT_MODEL.to_string(),
            embedding_model: DEFAULT_EMBEDDING_MODEL.to_string(),
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

impl ModelConfig {
    /// Effective Ollama base URL
    pub fn ollama_url(&self) -> String {
        self.base_url
            .clone()
            .unwrap_or_else(|| format!("http://{}:{}", self.host, self.port))
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            backend: RetrievalBackend::Weaviate,
            mode: QueryMode::Hybrid,
            top_k: DEFAULT_TOP_K,
            documents_top_k: DEFAULT_DOCUMENTS_TOP_K,
            alpha: DEFAULT_ALPHA,
            embed_queries: true,
            weaviate_url: DEFAULT_WEAVIATE_URL.to_string(),
            index: DEFAULT_INDEX.to_string(),
            text_property: DEFAULT_TEXT_PROPERTY.to_string(),
            metadata_properties: vec!["file_name".to_string(), "page_label".to_string()],
            corpus_path: None,
        }
    }
}

impl RetrievalConfig {
    /// Request template carrying mode, `top_k` and alpha
    pub fn request_defaults(&self) -> RetrievalRequest {
        RetrievalRequest::new("")
            .with_mode(self.mode)
            .with_top_k(self.top_k)
            .with_alpha(self.alpha)
    }
}

impl Default for GraphSection {
    fn default() -> Self {
        Self {
            max_rewrites: DEFAULT_MAX_REWRITES,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json: false,
        }
    }
}

impl Config {
    /// Load configuration from `path`, or from the default location
    ///
    /// Environment overrides are applied and the result is validated.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::load_from_file(path)?,
            None => Self::load_default()?,
        };

        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| RagError::ConfigError(format!("Failed to read {}: {}", path.display(), e)))?;

        toml::from_str(&contents)
            .map_err(|e| RagError::ConfigError(format!("Failed to parse {}: {}", path.display(), e)))
    }

    /// Load from the default location, writing defaults there on first use
    pub fn load_default() -> Result<Self> {
        Self::load_or_init(&Self::default_path()?)
    }

    /// Load `path`, or return defaults and try to write them there
    ///
    /// A failed write is reported on stderr and does not fail the load.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from_file(path);
        }

        let config = Config::default();
        if let Err(e) = config.save_to(path) {
            // Logging is not initialized until the config is loaded
            eprintln!("warning: could not write default config to {}: {}", path.display(), e);
        }
        Ok(config)
    }

    /// Save configuration to `path`, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let toml_string = toml::to_string_pretty(self)
            .map_err(|e| RagError::ConfigError(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, toml_string)?;
        Ok(())
    }

    /// Get the default configuration file path
    pub fn default_path() -> Result<PathBuf> {
        let home = dirs::home_dir()
            .ok_or_else(|| RagError::ConfigError("Could not determine home directory".to_string()))?;

        Ok(home.join(".agentic-rag").join("config.toml"))
    }

    /// Apply overrides from a variable lookup (the environment in production)
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(url) = lookup(ENV_OLLAMA_URL) {
            self.model.base_url = Some(url);
        }
        if let Some(model) = lookup(ENV_CHAT_MODEL) {
            self.model.chat_model = model;
        }
        if let Some(url) = lookup(ENV_WEAVIATE_URL) {
            self.retrieval.weaviate_url = url;
        }
        if let Some(index) = lookup(ENV_INDEX) {
            self.retrieval.index = index;
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.retrieval.alpha) {
            return Err(RagError::ConfigError(format!(
                "retrieval.alpha must be between 0.0 and 1.0, got {}",
                self.retrieval.alpha
            )));
        }

        if self.retrieval.top_k == 0 {
            return Err(RagError::ConfigError(
                "retrieval.top_k must be greater than 0".to_string(),
            ));
        }

        if self.model.chat_model.trim().is_empty() {
            return Err(RagError::ConfigError(
                "model.chat_model must not be empty".to_string(),
            ));
        }

        if self.model.embedding_model.trim().is_empty() {
            return Err(RagError::ConfigError(
                "model.embedding_model must not be empty".to_string(),
            ));
        }

        if self.retrieval.backend == RetrievalBackend::Memory && self.retrieval.corpus_path.is_none() {
            return Err(RagError::ConfigError(
                "retrieval.corpus_path is required for the memory backend".to_string(),
            ));
        }

        Ok(())
    }

    /// Graph configuration derived from `[graph]` and `[retrieval]`
    pub fn graph_config(&self) -> GraphConfig {
        GraphConfig {
            max_rewrites: self.graph.max_rewrites,
            retrieval: self.retrieval.request_defaults(),
        }
    }
}
