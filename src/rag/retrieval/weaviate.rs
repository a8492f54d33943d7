//! Weaviate retriever
//!
//! Issues GraphQL `Get` queries against a Weaviate class:
//! - Hybrid: `hybrid { query, alpha, vector? }`
//! - Dense: `nearVector { vector }` (requires an embedder)
//! - Sparse: `bm25 { query }`
//!
//! Weaviate's hybrid `alpha` weights the vector side (1.0 = pure vector),
//! while `RetrievalRequest::alpha` weights the sparse side, so the value
//! is flipped on the way out.

use crate::config::RetrievalConfig;
use crate::errors::{RagError, Result};
use crate::models::Embedder;
use crate::rag::retrieval::{QueryMode, RetrievalRequest, Retriever, ScoredFragment};
use crate::types::{Metadata, MetadataValue};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Default Weaviate endpoint
pub const DEFAULT_WEAVIATE_URL: &str = "http://127.0.0.1:8080";

/// Default class holding indexed fragments
pub const DEFAULT_INDEX: &str = "Documents";

/// Default property holding fragment text
pub const DEFAULT_TEXT_PROPERTY: &str = "text";

/// Retriever backed by a Weaviate index
pub struct WeaviateRetriever {
    client: Client,
    base_url: String,
    index: String,
    text_property: String,
    metadata_properties: Vec<String>,
    embedder: Option<Arc<dyn Embedder>>,
}

impl WeaviateRetriever {
    /// Create a retriever for `index` at `base_url`
    pub fn new(base_url: &str, index: &str) -> Result<Self> {
        Self::build(
            base_url,
            index,
            DEFAULT_TEXT_PROPERTY,
            Vec::new(),
            Duration::from_secs(30),
        )
    }

    /// Create a retriever from the `[retrieval]` config section
    pub fn from_config(config: &RetrievalConfig, timeout: Duration) -> Result<Self> {
        Self::build(
            &config.weaviate_url,
            &config.index,
            &config.text_property,
            config.metadata_properties.clone(),
            timeout,
        )
    }

    fn build(
        base_url: &str,
        index: &str,
        text_property: &str,
        metadata_properties: Vec<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(RagError::HttpError)?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            index: index.to_string(),
            text_property: text_property.to_string(),
            metadata_properties,
            embedder: None,
        })
    }

    /// Embed queries client-side (needed for dense mode and for classes without a vectorizer)
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    async fn query_vector(&self, query: &str) -> Result<Option<Vec<f32>>> {
        match &self.embedder {
            Some(embedder) => {
                let mut vectors = embedder.embed(&[query.to_string()]).await?;
                Ok(vectors.pop())
            }
            None => Ok(None),
        }
    }

    /// Build the GraphQL document for a request
    fn build_query(&self, request: &RetrievalRequest, vector: Option<&[f32]>) -> Result<String> {
        let query = serde_json::to_string(&request.query)?;

        let search = match request.mode {
            QueryMode::Hybrid => {
                let vector_arg = match vector {
                    Some(v) => format!(", vector: {}", serde_json::to_string(v)?),
                    None => String::new(),
                };
                format!(
                    "hybrid: {{query: {}, alpha: {}{}}}",
                    query,
                    1.0 - request.alpha,
                    vector_arg
                )
            }
            QueryMode::Dense => {
                let v = vector.ok_or_else(|| {
                    RagError::RetrievalError("dense retrieval needs an embedder".to_string())
                })?;
                format!("nearVector: {{vector: {}}}", serde_json::to_string(v)?)
            }
            QueryMode::Sparse => format!("bm25: {{query: {}}}", query),
        };

        let additional = match request.mode {
            QueryMode::Dense => "_additional { distance }",
            _ => "_additional { score }",
        };

        let mut fields = vec![self.text_property.clone()];
        fields.extend(self.metadata_properties.iter().cloned());

        Ok(format!(
            "{{ Get {{ {}(limit: {}, {}) {{ {} {} }} }} }}",
            self.index,
            request.top_k,
            search,
            fields.join(" "),
            additional
        ))
    }

    /// Convert GraphQL objects into fragments
    fn parse_objects(&self, objects: Vec<Value>) -> Vec<ScoredFragment> {
        objects
            .into_iter()
            .filter_map(|object| {
                let text = object.get(&self.text_property)?.as_str()?.to_string();

                let additional = object.get("_additional");
                let score = additional
                    .and_then(|a| a.get("score"))
                    .and_then(parse_score)
                    .or_else(|| {
                        additional
                            .and_then(|a| a.get("distance"))
                            .and_then(parse_score)
                            .map(|d| 1.0 - d)
                    })
                    .unwrap_or(0.0);

                let metadata: Metadata = self
                    .metadata_properties
                    .iter()
                    .filter_map(|key| {
                        let value = MetadataValue::from_json(object.get(key)?)?;
                        Some((key.clone(), value))
                    })
                    .collect();

                Some(ScoredFragment::new(text, score).with_metadata(metadata))
            })
            .collect()
    }
}

/// Weaviate returns scores as strings in some modes and numbers in others
fn parse_score(value: &Value) -> Option<f32> {
    match value {
        Value::Number(n) => n.as_f64().map(|f| f as f32),
        Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

#[derive(Debug, Deserialize)]
struct GraphQlResponse {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[async_trait]
impl Retriever for WeaviateRetriever {
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<ScoredFragment>> {
        request.validate()?;
        if request.top_k == 0 {
            return Ok(Vec::new());
        }

        let vector = match request.mode {
            QueryMode::Sparse => None,
            _ => self.query_vector(&request.query).await?,
        };
        let graphql = self.build_query(request, vector.as_deref())?;

        tracing::debug!(index = %self.index, mode = %request.mode, top_k = request.top_k, "weaviate query");

        let url = format!("{}/v1/graphql", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({ "query": graphql }))
            .send()
            .await
            .map_err(|e| RagError::RetrievalError(format!("Failed to reach Weaviate: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(RagError::RetrievalError(format!("HTTP {}: {}", status, body)));
        }

        let body: GraphQlResponse = response
            .json()
            .await
            .map_err(|e| RagError::RetrievalError(format!("Failed to parse response: {}", e)))?;

        if let Some(error) = body.errors.first() {
            return Err(RagError::RetrievalError(error.message.clone()));
        }

        let objects = body
            .data
            .as_ref()
            .and_then(|d| d.get("Get"))
            .and_then(|g| g.get(&self.index))
            .and_then(|o| o.as_array())
            .cloned()
            .unwrap_or_default();

        let mut fragments = self.parse_objects(objects);
        fragments.truncate(request.top_k);
        Ok(fragments)
    }

    fn name(&self) -> &str {
        "weaviate"
    }
}
