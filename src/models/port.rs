//! Model port
//!
//! The capabilities the graph and the simple query service need from a
//! language model. Implementations are shared across requests, so they
//! must be `Send + Sync` and hold no per-request state.

use crate::errors::Result;
use crate::models::types::{ChatMessage, ModelReply};
use crate::tools::ToolSchema;
use async_trait::async_trait;

/// Chat model in text mode and structured mode
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Text mode: answer in text or request tool calls from `tools`
    async fn invoke(&self, messages: &[ChatMessage], tools: &[ToolSchema]) -> Result<ModelReply>;

    /// Structured mode: return a JSON value meant to conform to `shape`
    ///
    /// Conformance is checked by the caller, not the model.
    async fn invoke_structured(
        &self,
        messages: &[ChatMessage],
        shape: &serde_json::Value,
    ) -> Result<serde_json::Value>;

    /// Model identifier for logs
    fn name(&self) -> &str;
}

/// Text embedding capability used by dense retrieval
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed each text; the output has one vector per input, in order
    async fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}
