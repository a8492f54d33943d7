//! Tool declaration types
//!
//! A tool is declared to the model by name, description and a JSON
//! schema for its arguments, and executed when the model calls it.

use crate::errors::Result;
use crate::types::{ToolCall, Turn};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Tool schema definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    /// Tool name
    pub name: String,

    /// Tool description shown to the model
    pub description: String,

    /// Parameter schema (JSON Schema)
    pub parameters: serde_json::Value,
}

impl ToolSchema {
    /// Create new tool schema
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
        }
    }

    /// Names listed under the schema's `required` array
    pub fn required_params(&self) -> Vec<&str> {
        self.parameters
            .get("required")
            .and_then(|r| r.as_array())
            .map(|r| r.iter().filter_map(|v| v.as_str()).collect())
            .unwrap_or_default()
    }
}

/// An executable tool
#[async_trait]
pub trait Tool: Send + Sync {
    /// Declaration handed to the model
    fn schema(&self) -> &ToolSchema;

    /// Check argument values beyond the schema's required keys
    ///
    /// Runs before any call of the same turn is executed.
    fn check_arguments(&self, _call: &ToolCall) -> Result<()> {
        Ok(())
    }

    /// Execute a call, producing the tool-result turn
    async fn call(&self, call: &ToolCall) -> Result<Turn>;
}
