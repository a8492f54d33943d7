//! Retrieval tool
//!
//! Exposes a `Retriever` to the agent as the `retrieve` tool. The model
//! supplies only the query; mode, `top_k` and `alpha` come from the
//! configured defaults.

use crate::errors::{RagError, Result};
use crate::rag::context::AssembledContext;
use crate::rag::retrieval::{RetrievalRequest, Retriever};
use crate::tools::types::{Tool, ToolSchema};
use crate::types::{ToolCall, Turn};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;

/// Name the agent uses to call the retrieval tool
pub const RETRIEVE_TOOL: &str = "retrieve";

/// Declaration of the retrieval tool
pub fn retrieve_tool_schema() -> ToolSchema {
    ToolSchema::new(
        RETRIEVE_TOOL,
        "Search and return information from the indexed documents.",
        json!({
            "type": "object",
            "properties": {
                "query": {
                    "type": "string",
                    "description": "The query to search the documents for"
                }
            },
            "required": ["query"]
        }),
    )
}

/// The `retrieve` tool
pub struct RetrieveTool {
    retriever: Arc<dyn Retriever>,
    defaults: RetrievalRequest,
    schema: ToolSchema,
}

impl RetrieveTool {
    /// Tool with hybrid defaults (`top_k` 15, alpha 0.3)
    pub fn new(retriever: Arc<dyn Retriever>) -> Self {
        Self::with_defaults(retriever, RetrievalRequest::new(""))
    }

    /// Tool using the mode, `top_k` and alpha of `defaults`
    pub fn with_defaults(retriever: Arc<dyn Retriever>, defaults: RetrievalRequest) -> Self {
        Self {
            retriever,
            defaults,
            schema: retrieve_tool_schema(),
        }
    }

    /// Extract the `query` argument
    pub fn parse_query(call: &ToolCall) -> Result<String> {
        let malformed = |reason: &str| RagError::MalformedToolCall {
            tool: call.name.clone(),
            reason: reason.to_string(),
        };

        if call.name != RETRIEVE_TOOL {
            return Err(malformed("not the retrieval tool"));
        }

        match call.arguments.get("query") {
            Some(serde_json::Value::String(q)) if !q.trim().is_empty() => Ok(q.clone()),
            Some(serde_json::Value::String(_)) => Err(malformed("'query' is empty")),
            Some(_) => Err(malformed("'query' must be a string")),
            None => Err(malformed("missing required argument 'query'")),
        }
    }
}

#[async_trait]
impl Tool for RetrieveTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    fn check_arguments(&self, call: &ToolCall) -> Result<()> {
        Self::parse_query(call).map(|_| ())
    }

    async fn call(&self, call: &ToolCall) -> Result<Turn> {
        let query = Self::parse_query(call)?;
        let request = RetrievalRequest {
            query,
            ..self.defaults.clone()
        };

        let fragments = self.retriever.retrieve(&request).await?;
        let context = AssembledContext::from_fragments(fragments);

        tracing::info!(
            retriever = self.retriever.name(),
            query = %request.query,
            fragments = context.document_count(),
            "retrieval complete"
        );

        Ok(Turn::ToolResult {
            call_id: call.id.clone(),
            tool: RETRIEVE_TOOL.to_string(),
            content: context.text,
            sources: context.sources,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rag::retrieval::ScoredFragment;
    use crate::testing::StaticRetriever;

    fn tool() -> RetrieveTool {
        RetrieveTool::new(Arc::new(StaticRetriever::new(vec![
            ScoredFragment::new("Refunds are accepted within 30 days.", 0.9),
            ScoredFragment::new("Returns need a receipt.", 0.5),
        ])))
    }

    #[tokio::test]
    async fn test_call_produces_tool_result() {
        let call = ToolCall::new(RETRIEVE_TOOL, json!({"query": "refund policy"}));
        let turn = tool().call(&call).await.unwrap();

        match turn {
            Turn::ToolResult {
                call_id,
                tool,
                content,
                sources,
            } => {
                assert_eq!(call_id, call.id);
                assert_eq!(tool, "retrieve");
                assert_eq!(
                    content,
                    "Refunds are accepted within 30 days.\n\nReturns need a receipt."
                );
                assert_eq!(sources.len(), 2);
            }
            other => panic!("expected tool result, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_defaults_are_forwarded() {
        let retriever = Arc::new(StaticRetriever::new(vec![ScoredFragment::new("a", 1.0)]));
        let tool = RetrieveTool::with_defaults(
            retriever.clone(),
            RetrievalRequest::new("").with_top_k(0),
        );

        let call = ToolCall::new(RETRIEVE_TOOL, json!({"query": "anything"}));
        let turn = tool.call(&call).await.unwrap();
        assert_eq!(turn.content(), "");

        let seen = retriever.requests();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].query, "anything");
        assert_eq!(seen[0].top_k, 0);
    }

    #[test]
    fn test_parse_query_rejects_bad_arguments() {
        assert!(RetrieveTool::parse_query(&ToolCall::new(RETRIEVE_TOOL, json!({}))).is_err());
        assert!(RetrieveTool::parse_query(&ToolCall::new(RETRIEVE_TOOL, json!({"query": 42}))).is_err());
        assert!(RetrieveTool::parse_query(&ToolCall::new(RETRIEVE_TOOL, json!({"query": "  "}))).is_err());
        assert!(RetrieveTool::parse_query(&ToolCall::new("search", json!({"query": "x"}))).is_err());
        assert_eq!(
            RetrieveTool::parse_query(&ToolCall::new(RETRIEVE_TOOL, json!({"query": "x"}))).unwrap(),
            "x"
        );
    }

    #[test]
    fn test_registry_validation_checks_query_value() {
        let registry = crate::tools::ToolRegistry::new().with_tool(Arc::new(tool()));

        let err = registry
            .validate(&ToolCall::new(RETRIEVE_TOOL, json!({"query": 42})))
            .err()
            .unwrap();
        assert!(err.to_string().contains("'query' must be a string"));
        assert!(registry
            .validate(&ToolCall::new(RETRIEVE_TOOL, json!({"query": " "})))
            .is_err());
        assert!(registry
            .validate(&ToolCall::new(RETRIEVE_TOOL, json!({"query": "refund"})))
            .is_ok());
    }
}
