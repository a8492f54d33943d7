//! Model-facing message and reply types
//!
//! Turns in a conversation are rendered into `ChatMessage`s before they
//! reach a model; a model's answer comes back as a `ModelReply`.

use crate::types::{Role, ToolCall, Turn};
use serde::{Deserialize, Serialize};

/// A single message as sent to a chat model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,

    /// Tool calls issued by an assistant message
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Tool that produced a tool message
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_name: Option<String>,
}

impl ChatMessage {
    fn plain(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_name: None,
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::plain(Role::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::plain(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, content)
    }
}

impl From<&Turn> for ChatMessage {
    fn from(turn: &Turn) -> Self {
        match turn {
            Turn::ToolCallRequest { calls, content } => Self {
                role: Role::Assistant,
                content: content.clone(),
                tool_calls: calls.clone(),
                tool_name: None,
            },
            Turn::ToolResult { tool, content, .. } => Self {
                role: Role::Tool,
                content: content.clone(),
                tool_calls: Vec::new(),
                tool_name: Some(tool.clone()),
            },
            other => Self::plain(other.role(), other.content()),
        }
    }
}

/// Render a whole turn history for a model call
pub fn render_turns(turns: &[Turn]) -> Vec<ChatMessage> {
    turns.iter().map(ChatMessage::from).collect()
}

/// What a model returned in text mode
#[derive(Debug, Clone, PartialEq)]
pub enum ModelReply {
    /// Direct text answer
    Text(String),

    /// Request to invoke one or more tools
    ToolCalls {
        calls: Vec<ToolCall>,
        content: String,
    },
}

impl ModelReply {
    /// Convenience constructor for a single tool call
    pub fn tool_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        ModelReply::ToolCalls {
            calls: vec![ToolCall::new(name, arguments)],
            content: String::new(),
        }
    }

    pub fn is_tool_call(&self) -> bool {
        matches!(self, ModelReply::ToolCalls { .. })
    }

    /// Conversation turn recording this reply
    pub fn into_turn(self) -> Turn {
        match self {
            ModelReply::Text(content) => Turn::ModelText { content },
            ModelReply::ToolCalls { calls, content } => Turn::ToolCallRequest { calls, content },
        }
    }
}
