//! In-process retriever
//!
//! Keeps a small corpus in memory and scores it two ways:
//! - Dense: cosine similarity between query and fragment embeddings
//! - Sparse: BM25 from an in-RAM `tantivy` index
//!
//! Hybrid mode fuses both with relative-score fusion (see `fusion`).
//! The corpus can be loaded from a JSONL file, one `CorpusEntry` per line.

use crate::errors::{RagError, Result};
use crate::models::Embedder;
use crate::rag::retrieval::fusion;
use crate::rag::retrieval::{
    rank_and_truncate, QueryMode, RetrievalRequest, Retriever, ScoredFragment,
};
use crate::types::Metadata;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, TEXT};
use tantivy::{doc, Index, IndexReader, IndexWriter, ReloadPolicy, TantivyDocument};

/// Writer heap for building the in-RAM index
const WRITER_HEAP_BYTES: usize = 50_000_000;

/// One indexed fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorpusEntry {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,

    /// Precomputed embedding; entries without one are skipped by dense search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl CorpusEntry {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
            embedding: None,
        }
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_metadata(mut self, metadata: Metadata) -> Self {
        self.metadata = metadata;
        self
    }
}

/// BM25 index over fragment text, held in RAM
///
/// Each document stores the position of its `CorpusEntry`, so hits map
/// back to the corpus without storing the text twice.
struct SparseIndex {
    index: Index,
    reader: IndexReader,
    position_field: Field,
    text_field: Field,
}

impl SparseIndex {
    fn build(entries: &[CorpusEntry]) -> Result<Self> {
        let mut schema_builder = Schema::builder();
        let position_field = schema_builder.add_u64_field("position", STORED);
        let text_field = schema_builder.add_text_field("text", TEXT);
        let schema = schema_builder.build();

        let index = Index::create_in_ram(schema);
        let mut writer: IndexWriter = index.writer(WRITER_HEAP_BYTES).map_err(index_error)?;

        for (position, entry) in entries.iter().enumerate() {
            writer
                .add_document(doc!(
                    position_field => position as u64,
                    text_field => entry.text.as_str(),
                ))
                .map_err(index_error)?;
        }
        writer.commit().map_err(index_error)?;

        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::Manual)
            .try_into()
            .map_err(index_error)?;

        Ok(Self {
            index,
            reader,
            position_field,
            text_field,
        })
    }

    /// Entries matching at least one query term, with their BM25 score
    ///
    /// Query syntax errors are ignored; free text is treated as terms.
    fn score(&self, query: &str, limit: usize) -> Result<Vec<(usize, f32)>> {
        let searcher = self.reader.searcher();
        let query_parser = QueryParser::for_index(&self.index, vec![self.text_field]);
        let (query, _errors) = query_parser.parse_query_lenient(query);

        let top_docs = searcher
            .search(&query, &TopDocs::with_limit(limit.max(1)))
            .map_err(index_error)?;

        let mut scores = Vec::with_capacity(top_docs.len());
        for (score, address) in top_docs {
            let doc: TantivyDocument = searcher.doc(address).map_err(index_error)?;
            if let Some(position) = doc.get_first(self.position_field).and_then(|v| v.as_u64()) {
                scores.push((position as usize, score));
            }
        }
        Ok(scores)
    }
}

fn index_error(e: tantivy::TantivyError) -> RagError {
    RagError::RetrievalError(format!("sparse index: {}", e))
}

fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Retriever over an in-memory corpus
pub struct InMemoryRetriever {
    entries: Vec<CorpusEntry>,
    sparse: SparseIndex,
    embedder: Option<Arc<dyn Embedder>>,
}

impl InMemoryRetriever {
    /// Index a corpus for sparse retrieval
    pub fn new(entries: Vec<CorpusEntry>) -> Result<Self> {
        let sparse = SparseIndex::build(&entries)?;
        Ok(Self {
            entries,
            sparse,
            embedder: None,
        })
    }

    /// Enable dense retrieval with a query embedder
    pub fn with_embedder(mut self, embedder: Arc<dyn Embedder>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Load a corpus from a JSONL file (blank lines are skipped)
    pub fn from_jsonl(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let mut entries = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let entry: CorpusEntry = serde_json::from_str(line).map_err(|e| {
                RagError::RetrievalError(format!(
                    "{}:{}: invalid corpus entry: {}",
                    path.display(),
                    line_no + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        tracing::info!(path = %path.display(), entries = entries.len(), "corpus loaded");
        Self::new(entries)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    async fn dense_scores(&self, query: &str) -> Result<Option<Vec<(usize, f32)>>> {
        let Some(embedder) = &self.embedder else {
            return Ok(None);
        };

        let vectors = embedder.embed(&[query.to_string()]).await?;
        let query_vec = vectors
            .into_iter()
            .next()
            .ok_or_else(|| RagError::RetrievalError("embedder returned no vector".to_string()))?;

        let scores = self
            .entries
            .iter()
            .enumerate()
            .filter_map(|(idx, entry)| {
                entry
                    .embedding
                    .as_ref()
                    .map(|e| (idx, cosine_similarity(&query_vec, e)))
            })
            .collect();

        Ok(Some(scores))
    }

    fn to_fragments(&self, scored: Vec<(usize, f32)>) -> Vec<ScoredFragment> {
        scored
            .into_iter()
            .map(|(idx, score)| {
                let entry = &self.entries[idx];
                ScoredFragment::new(entry.text.clone(), score).with_metadata(entry.metadata.clone())
            })
            .collect()
    }
}

#[async_trait]
impl Retriever for InMemoryRetriever {
    async fn retrieve(&self, request: &RetrievalRequest) -> Result<Vec<ScoredFragment>> {
        request.validate()?;
        if request.top_k == 0 || self.entries.is_empty() {
            return Ok(Vec::new());
        }

        let scored = match request.mode {
            QueryMode::Sparse => self.sparse.score(&request.query, self.entries.len())?,
            QueryMode::Dense => self.dense_scores(&request.query).await?.ok_or_else(|| {
                RagError::RetrievalError("dense retrieval needs an embedder".to_string())
            })?,
            QueryMode::Hybrid => {
                let sparse = self.sparse.score(&request.query, self.entries.len())?;
                match self.dense_scores(&request.query).await? {
                    Some(dense) => fusion::fuse(&dense, &sparse, request.alpha),
                    None => {
                        tracing::debug!("no embedder configured, hybrid falls back to sparse");
                        sparse
                    }
                }
            }
        };

        Ok(rank_and_truncate(self.to_fragments(scored), request.top_k))
    }

    fn name(&self) -> &str {
        "memory"
    }
}
