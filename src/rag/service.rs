//! Simple query service
//!
//! Non-agentic path: one hybrid retrieval, one model call, no branching.
//! Also serves the documents-only variant, which skips the model.

use crate::errors::{RagError, Result};
use crate::models::{ChatModel, ModelReply};
use crate::rag::context::AssembledContext;
use crate::rag::prompts::{self, INSUFFICIENT_EVIDENCE_ANSWER};
use crate::rag::retrieval::{RetrievalRequest, Retriever};
use crate::types::{QueryResponse, Source};
use chrono::NaiveDate;
use std::sync::Arc;

/// Default number of fragments for the documents-only variant
pub const DEFAULT_DOCUMENTS_TOP_K: usize = 10;

/// Single-shot retrieval-augmented answering
pub struct SimpleQueryService {
    model: Arc<dyn ChatModel>,
    retriever: Arc<dyn Retriever>,
    defaults: RetrievalRequest,
    documents_top_k: usize,
    fixed_date: Option<NaiveDate>,
}

impl SimpleQueryService {
    pub fn new(model: Arc<dyn ChatModel>, retriever: Arc<dyn Retriever>) -> Self {
        Self {
            model,
            retriever,
            defaults: RetrievalRequest::new(""),
            documents_top_k: DEFAULT_DOCUMENTS_TOP_K,
            fixed_date: None,
        }
    }

    /// Use the mode, `top_k` and alpha of `defaults` for `query`
    pub fn with_defaults(mut self, defaults: RetrievalRequest) -> Self {
        self.defaults = defaults;
        self
    }

    /// Default `top_k` for `documents`
    pub fn with_documents_top_k(mut self, top_k: usize) -> Self {
        self.documents_top_k = top_k;
        self
    }

    /// Pin the date shown to the model
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    fn today(&self) -> NaiveDate {
        self.fixed_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }

    /// Answer `query` from one retrieval
    pub async fn query(&self, query: &str) -> Result<QueryResponse> {
        let request = RetrievalRequest {
            query: query.to_string(),
            ..self.defaults.clone()
        };
        let fragments = self.retriever.retrieve(&request).await?;
        let context = AssembledContext::from_fragments(fragments);

        if context.is_empty() {
            tracing::info!(query, "no fragments retrieved, skipping model call");
            return Ok(QueryResponse::answer(INSUFFICIENT_EVIDENCE_ANSWER, Vec::new()));
        }

        let messages = prompts::query_messages(query, &context.text, self.today());
        let reply = self.model.invoke(&messages, &[]).await?;

        let message = match reply {
            ModelReply::Text(text) => text,
            ModelReply::ToolCalls { calls, .. } => {
                return Err(RagError::ContractViolation(format!(
                    "model requested {} tool call(s) but no tools were offered",
                    calls.len()
                )));
            }
        };

        tracing::info!(
            query,
            model = self.model.name(),
            sources = context.document_count(),
            "simple query answered"
        );

        Ok(QueryResponse::answer(message, context.sources))
    }

    /// Ranked fragments for `query` without calling the model
    pub async fn documents(&self, query: &str, top_k: Option<usize>) -> Result<Vec<Source>> {
        let request = RetrievalRequest {
            query: query.to_string(),
            top_k: top_k.unwrap_or(self.documents_top_k),
            ..self.defaults.clone()
        };

        let fragments = self.retriever.retrieve(&request).await?;
        Ok(fragments.into_iter().map(Source::from).collect())
    }
}
