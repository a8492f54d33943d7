//! Tool registry
//!
//! Maintains the tools the agent may call and dispatches tool calls.
//! A call naming an unregistered tool, missing a required argument, or
//! failing the tool's own argument check is a malformed tool call and is
//! never executed.

use crate::errors::{RagError, Result};
use crate::tools::types::{Tool, ToolSchema};
use crate::types::{ToolCall, Turn};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tool registry
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Map of tool name to tool, ordered by name
    tools: BTreeMap<String, Arc<dyn Tool>>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool under its schema name, replacing any previous one
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        self.tools.insert(tool.schema().name.clone(), tool);
    }

    /// Builder-style `register`
    pub fn with_tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.register(tool);
        self
    }

    /// Check if tool exists
    pub fn contains(&self, name: &str) -> bool {
        self.tools.contains_key(name)
    }

    /// Get all tool schemas
    pub fn schemas(&self) -> Vec<ToolSchema> {
        self.tools.values().map(|t| t.schema().clone()).collect()
    }

    /// Get all tool names
    pub fn tool_names(&self) -> Vec<String> {
        self.tools.keys().cloned().collect()
    }

    /// Get total number of tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if registry is empty
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Validate a call against the registered schema
    pub fn validate(&self, call: &ToolCall) -> Result<&Arc<dyn Tool>> {
        let tool = self
            .tools
            .get(&call.name)
            .ok_or_else(|| RagError::MalformedToolCall {
                tool: call.name.clone(),
                reason: format!("unknown tool (available: {})", self.tool_names().join(", ")),
            })?;

        let args = call
            .arguments
            .as_object()
            .ok_or_else(|| RagError::MalformedToolCall {
                tool: call.name.clone(),
                reason: "arguments must be a JSON object".to_string(),
            })?;

        if let Some(missing) = tool
            .schema()
            .required_params()
            .into_iter()
            .find(|p| !args.contains_key(*p))
        {
            return Err(RagError::MalformedToolCall {
                tool: call.name.clone(),
                reason: format!("missing required argument '{}'", missing),
            });
        }

        tool.check_arguments(call)?;
        Ok(tool)
    }

    /// Validate and execute a call
    pub async fn dispatch(&self, call: &ToolCall) -> Result<Turn> {
        let tool = self.validate(call)?;
        tool.call(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;

    struct EchoTool {
        schema: ToolSchema,
    }

    impl EchoTool {
        fn new() -> Self {
            Self {
                schema: ToolSchema::new(
                    "echo",
                    "Echo the text argument",
                    json!({
                        "type": "object",
                        "properties": {"text": {"type": "string"}},
                        "required": ["text"]
                    }),
                ),
            }
        }
    }

    #[async_trait]
    impl Tool for EchoTool {
        fn schema(&self) -> &ToolSchema {
            &self.schema
        }

        async fn call(&self, call: &ToolCall) -> Result<Turn> {
            Ok(Turn::ToolResult {
                call_id: call.id.clone(),
                tool: "echo".to_string(),
                content: call.arguments["text"].as_str().unwrap_or_default().to_string(),
                sources: Vec::new(),
            })
        }
    }

    fn registry() -> ToolRegistry {
        ToolRegistry::new().with_tool(Arc::new(EchoTool::new()))
    }

    #[test]
    fn test_registry_creation() {
        let registry = registry();
        assert_eq!(registry.len(), 1);
        assert!(registry.contains("echo"));
        assert_eq!(registry.schemas()[0].name, "echo");
        assert!(ToolRegistry::new().is_empty());
    }

    #[test]
    fn test_dispatch() {
        let call = ToolCall::new("echo", json!({"text": "hello"}));
        let turn = tokio_test::block_on(registry().dispatch(&call)).unwrap();
        assert_eq!(turn.content(), "hello");
        assert!(matches!(turn, Turn::ToolResult { ref call_id, .. } if *call_id == call.id));
    }

    #[tokio::test]
    async fn test_unknown_tool_rejected() {
        let call = ToolCall::new("web_search", json!({"text": "hello"}));
        let err = registry().dispatch(&call).await.unwrap_err();
        assert!(matches!(err, RagError::MalformedToolCall { ref tool, .. } if tool == "web_search"));
        assert!(err.to_string().contains("echo"));
    }

    #[test]
    fn test_missing_argument_rejected() {
        let registry = registry();
        let err = registry
            .validate(&ToolCall::new("echo", json!({})))
            .err()
            .unwrap();
        assert!(err.to_string().contains("missing required argument 'text'"));

        assert!(registry.validate(&ToolCall::new("echo", json!("text"))).is_err());
    }
}
