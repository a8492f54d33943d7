//! Retrieval port
//!
//! Given a query, a retriever returns an ordered list of scored text
//! fragments. Backends:
//! - `InMemoryRetriever`: in-process cosine + BM25 over a fixed corpus
//! - `WeaviateRetriever`: GraphQL queries against a Weaviate index

pub mod fusion;
pub mod memory;
pub mod weaviate;

use crate::errors::{RagError, Result};
use crate::types::{Metadata, Source};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub use memory::{CorpusEntry, InMemoryRetriever};
pub use weaviate::WeaviateRetriever;

/// Default number of fragments per retrieval
pub const DEFAULT_TOP_K: usize = 15;

/// Default sparse weight for hybrid retrieval
pub const DEFAULT_ALPHA: f32 = 0.3;

/// Retrieval strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryMode {
    /// Embedding similarity only
    Dense,
    /// Keyword (BM25) only
    Sparse,
    /// Weighted blend of sparse and dense scores
    #[default]
    Hybrid,
}

impl fmt::Display for QueryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryMode::Dense => "dense",
            QueryMode::Sparse => "sparse",
            QueryMode::Hybrid => "hybrid",
        };
        f.write_str(name)
    }
}

/// Parameters of a single retrieval call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievalRequest {
    pub query: String,
    pub mode: QueryMode,

    /// Maximum fragments to return; zero returns nothing
    pub top_k: usize,

    /// Sparse weight in hybrid mode: `alpha·sparse + (1−alpha)·dense`
    pub alpha: f32,
}

impl RetrievalRequest {
    /// Hybrid request with default `top_k` and `alpha`
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            mode: QueryMode::Hybrid,
            top_k: DEFAULT_TOP_K,
            alpha: DEFAULT_ALPHA,
        }
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.alpha = alpha;
        self
    }

    /// Reject parameters no backend can honor
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.alpha) {
            return Err(RagError::RetrievalError(format!(
                "alpha must be within [0, 1], got {}",
                self.alpha
            )));
        }
        Ok(())
    }
}

/// A retrieved text fragment with its relevance score
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFragment {
    pub text: String,
    pub score: f32,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ScoredFragment {
    pub fn new(text: impl Into<String>, score: f32) -> Self {
        Self {
            text: text.into(),
            score,
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

impl From<ScoredFragment> for Source {
    fn from(fragment: ScoredFragment) -> Self {
        Source {
            text: fragment.text,
            metadata: fragment.metadata,
        }
    }
}

/// Retrieval capability shared by the graph and the simple query service
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Fragments ordered by descending score, at most `request.top_k`
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<ScoredFragment>>;

    /// Backend identifier for logs
    fn name(&self) -> &str;
}

/// Sort fragments by descending score and keep the first `top_k`
pub(crate) fn rank_and_truncate(mut fragments: Vec<ScoredFragment>, top_k: usize) -> Vec<ScoredFragment> {
    fragments.sort_by(|a, b| {
        b.score
            .partial_cmp(&a.score)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    fragments.truncate(top_k);
    fragments
}
