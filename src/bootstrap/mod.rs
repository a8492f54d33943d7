//! Bootstrap for agentic-rag
//!
//! Checks that Ollama is up with the configured models pulled, and wires the
//! configured adapters into a `RagGraph` or `SimpleQueryService`.

use crate::agent::{GraphPorts, RagGraph};
use crate::config::{Config, RetrievalBackend};
use crate::errors::{RagError, Result};
use crate::models::{Embedder, OllamaClient};
use crate::rag::retrieval::{InMemoryRetriever, WeaviateRetriever};
use crate::rag::{ModelGrader, Retriever, SimpleQueryService};
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

/// Exit code for setup needed
pub const EXIT_CODE_SETUP_NEEDED: i32 = 2;

/// Ollama API tags response
#[derive(Debug, Deserialize)]
struct TagsResponse {
    models: Vec<ModelInfo>,
}

/// Model information from Ollama API
#[derive(Debug, Deserialize)]
struct ModelInfo {
    name: String,
}

/// Bootstrap check result
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStatus {
    Ready,
    OllamaNotRunning,
    ModelNotAvailable(String),
}

/// Configured adapters, shared by every run
pub struct Bootstrap {
    config: Config,
    client: Arc<OllamaClient>,
    http: Client,
}

impl Bootstrap {
    /// Build the Ollama client described by `config`
    pub fn new(config: Config) -> Result<Self> {
        let client = Arc::new(OllamaClient::from_config(&config.model)?);
        let http = Client::builder()
            .timeout(Duration::from_secs(5))
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            config,
            client,
            http,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Shared Ollama client
    pub fn client(&self) -> Arc<OllamaClient> {
        self.client.clone()
    }

    /// Verify Ollama is reachable and every model the run needs is pulled
    pub async fn check(&self) -> Result<BootstrapStatus> {
        if !self.client.health_check().await? {
            return Ok(BootstrapStatus::OllamaNotRunning);
        }

        let installed = self.list_models().await?;
        for wanted in required_models(&self.config) {
            if !is_installed(&installed, wanted) {
                return Ok(BootstrapStatus::ModelNotAvailable(wanted.to_string()));
            }
        }

        Ok(BootstrapStatus::Ready)
    }

    /// Get list of installed models
    pub async fn list_models(&self) -> Result<Vec<String>> {
        let url = format!("{}/api/tags", self.client.base_url());

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| RagError::ModelApiError(format!("Failed to query models: {}", e)))?;

        if !response.status().is_success() {
            return Err(RagError::ModelApiError(format!(
                "API returned status: {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| RagError::ModelApiError(format!("Failed to parse response: {}", e)))?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }

    /// Retriever for the configured backend
    ///
    /// Query embedding uses the Ollama embedding model when enabled.
    pub fn retriever(&self) -> Result<Arc<dyn Retriever>> {
        let retrieval = &self.config.retrieval;
        let embedder: Option<Arc<dyn Embedder>> = retrieval
            .embed_queries
            .then(|| self.client.clone() as Arc<dyn Embedder>);

        match retrieval.backend {
            RetrievalBackend::Weaviate => {
                let timeout = Duration::from_secs(self.config.model.timeout_secs);
                let mut retriever = WeaviateRetriever::from_config(retrieval, timeout)?;
                if let Some(embedder) = embedder {
                    retriever = retriever.with_embedder(embedder);
                }
                Ok(Arc::new(retriever))
            }
            RetrievalBackend::Memory => {
                let path = retrieval.corpus_path.as_deref().ok_or_else(|| {
                    RagError::ConfigError("retrieval.corpus_path is required for the memory backend".to_string())
                })?;

                let mut retriever = InMemoryRetriever::from_jsonl(path)?;
                if let Some(embedder) = embedder {
                    retriever = retriever.with_embedder(embedder);
                }
                Ok(Arc::new(retriever))
            }
        }
    }

    /// Agentic graph over the configured adapters
    pub fn graph(&self) -> Result<RagGraph> {
        let ports = GraphPorts {
            model: self.client.clone(),
            retriever: self.retriever()?,
            grader: Arc::new(ModelGrader::new(self.client.clone())),
        };
        Ok(RagGraph::new(ports, self.config.graph_config()))
    }

    /// Single-pass query service over the configured adapters
    pub fn service(&self) -> Result<SimpleQueryService> {
        Ok(SimpleQueryService::new(self.client.clone(), self.retriever()?)
            .with_defaults(self.config.retrieval.request_defaults())
            .with_documents_top_k(self.config.retrieval.documents_top_k))
    }

    /// Display installation instructions for Ollama
    pub fn show_ollama_install_instructions(&self) {
        eprintln!("\nOllama is not reachable at {}", self.client.base_url());
        eprintln!("\nInstall:");
        eprintln!("   Linux:   curl -fsSL https://ollama.com/install.sh | sh");
        eprintln!("   macOS:   brew install ollama");
        eprintln!("\nStart:");
        eprintln!("   ollama serve");
        eprintln!();
    }

    /// Display instructions for pulling a model
    pub fn show_model_pull_instructions(model_tag: &str) {
        eprintln!("\nModel '{}' not found!", model_tag);
        eprintln!("\nTo download this model, run:");
        eprintln!("   ollama pull {}", model_tag);
        eprintln!("\nOr set a different model in the [model] section of the config file.");
        eprintln!();
    }
}

/// Ollama reports untagged pulls as `name:latest`
/// Models that must be pulled before a run
///
/// The embedding model is only needed when queries are embedded.
fn required_models(config: &Config) -> Vec<&str> {
    let mut models = vec![config.model.chat_model.as_str()];
    if config.retrieval.embed_queries {
        models.push(config.model.embedding_model.as_str());
    }
    models
}

fn is_installed(installed: &[String], wanted: &str) -> bool {
    installed
        .iter()
        .any(|name| name == wanted || name.strip_suffix(":latest") == Some(wanted))
}
