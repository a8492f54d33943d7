//! Language model port and adapters
//!
//! This module provides:
//! - The `ChatModel` and `Embedder` capabilities consumed by the graph
//! - Model-facing message and reply types
//! - An Ollama-backed implementation of both capabilities

pub mod client;
pub mod port;
pub mod types;

// Re-export key types for convenience
pub use client::OllamaClient;
pub use port::{ChatModel, Embedder};
pub use types::{render_turns, ChatMessage, ModelReply};
