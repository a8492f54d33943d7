//! Turn types for graph conversations
//!
//! Defines the turns exchanged between the user, the model and the
//! retrieval tool while a graph run is in progress.

use serde::{Deserialize, Serialize};

use crate::types::response::Source;

/// Speaker of a turn, as seen by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    /// Wire name used by chat APIs
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// A tool invocation requested by the model
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolCall {
    /// Call identifier, echoed back on the matching tool result
    pub id: String,

    /// Requested tool name
    pub name: String,

    /// Arguments as a JSON object
    pub arguments: serde_json::Value,
}

impl ToolCall {
    /// Create a tool call with a fresh identifier
    pub fn new(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: format!("call_{}", uuid::Uuid::new_v4().simple()),
            name: name.into(),
            arguments,
        }
    }
}

/// One entry in a graph conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "turn", rename_all = "snake_case")]
pub enum Turn {
    /// The question that started the run (always the first turn)
    UserQuestion { content: String },

    /// A reformulation of the original question produced by the rewrite node
    RewrittenQuestion { content: String },

    /// Free-text model output
    ModelText { content: String },

    /// Model asked for one or more tool invocations instead of answering
    ToolCallRequest {
        calls: Vec<ToolCall>,
        #[serde(default, skip_serializing_if = "String::is_empty")]
        content: String,
    },

    /// Output of a tool invocation
    ToolResult {
        call_id: String,
        tool: String,
        content: String,
        #[serde(default)]
        sources: Vec<Source>,
    },
}

impl Turn {
    /// Build a user question turn
    pub fn question(content: impl Into<String>) -> Self {
        Turn::UserQuestion {
            content: content.into(),
        }
    }

    /// Build a model text turn
    pub fn model_text(content: impl Into<String>) -> Self {
        Turn::ModelText {
            content: content.into(),
        }
    }

    /// Textual content of this turn (empty for a bare tool-call request)
    pub fn content(&self) -> &str {
        match self {
            Turn::UserQuestion { content }
            | Turn::RewrittenQuestion { content }
            | Turn::ModelText { content }
            | Turn::ToolCallRequest { content, .. }
            | Turn::ToolResult { content, .. } => content.as_str(),
        }
    }

    /// Role the model sees for this turn
    pub fn role(&self) -> Role {
        match self {
            Turn::UserQuestion { .. } | Turn::RewrittenQuestion { .. } => Role::User,
            Turn::ModelText { .. } | Turn::ToolCallRequest { .. } => Role::Assistant,
            Turn::ToolResult { .. } => Role::Tool,
        }
    }

    /// Short label used in logs and traces
    pub fn kind(&self) -> &'static str {
        match self {
            Turn::UserQuestion { .. } => "user_question",
            Turn::RewrittenQuestion { .. } => "rewritten_question",
            Turn::ModelText { .. } => "model_text",
            Turn::ToolCallRequest { .. } => "tool_call_request",
            Turn::ToolResult { .. } => "tool_result",
        }
    }

    /// Tool calls carried by this turn, if any
    pub fn tool_calls(&self) -> &[ToolCall] {
        match self {
            Turn::ToolCallRequest { calls, .. } => calls,
            _ => &[],
        }
    }
}
