//! agentic-rag - Agentic retrieval-augmented question answering
//!
//! Answers questions over an indexed corpus. A chat model decides whether to
//! retrieve, retrieved fragments are graded for relevance, and the question
//! is rewritten and retried when they miss.
//!
//! # Architecture
//!
//! - **agent**: graph state machine, conversation log, nodes, orchestrator
//! - **rag**: retrieval ports and adapters, grading, prompts, simple query service
//! - **models**: chat/embedding ports and the Ollama adapter
//! - **tools**: tool schemas, registry, and the `retrieve` tool
//! - **bootstrap**, **cli**, **config**, **logging**: binary wiring

pub mod agent;
pub mod bootstrap;
pub mod cli;
pub mod config;
pub mod errors;
pub mod logging;
pub mod models;
pub mod rag;
pub mod testing;
pub mod tools;
pub mod types;

// Re-export commonly used types
pub use agent::{GraphConfig, GraphPorts, GraphRun, RagGraph, RunOutcome};
pub use errors::{RagError, Result};
pub use rag::SimpleQueryService;
pub use types::QueryResponse;
