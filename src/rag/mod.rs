//! Retrieval-augmented generation building blocks
//!
//! Components:
//! - Retrieval: the `Retriever` port plus in-memory and Weaviate backends
//! - Context: fragment assembly into a prompt-ready block
//! - Prompts: message builders for every model call
//! - Grader: structured relevance verdicts
//! - Service: the simple (non-agentic) query path

pub mod context;
pub mod grader;
pub mod prompts;
pub mod retrieval;
pub mod service;

// Re-export key types
pub use context::AssembledContext;
pub use grader::{ModelGrader, RelevanceGrader};
pub use prompts::INSUFFICIENT_EVIDENCE_ANSWER;
pub use retrieval::{QueryMode, RetrievalRequest, Retriever, ScoredFragment};
pub use service::SimpleQueryService;
