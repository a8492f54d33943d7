//! Response-side types
//!
//! Sources cited by an answer, the relevance verdict produced by the
//! grading step, and the query response returned to callers.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single metadata value attached to a fragment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MetadataValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl From<&str> for MetadataValue {
    fn from(value: &str) -> Self {
        MetadataValue::Text(value.to_string())
    }
}

impl From<String> for MetadataValue {
    fn from(value: String) -> Self {
        MetadataValue::Text(value)
    }
}

impl From<i64> for MetadataValue {
    fn from(value: i64) -> Self {
        MetadataValue::Integer(value)
    }
}

impl From<f64> for MetadataValue {
    fn from(value: f64) -> Self {
        MetadataValue::Float(value)
    }
}

impl From<bool> for MetadataValue {
    fn from(value: bool) -> Self {
        MetadataValue::Bool(value)
    }
}

impl MetadataValue {
    /// Convert a JSON scalar; arrays, objects and null have no metadata form
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Bool(b) => Some(MetadataValue::Bool(*b)),
            serde_json::Value::Number(n) => n
                .as_i64()
                .map(MetadataValue::Integer)
                .or_else(|| n.as_f64().map(MetadataValue::Float)),
            serde_json::Value::String(s) => Some(MetadataValue::Text(s.clone())),
            _ => None,
        }
    }
}

impl std::fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MetadataValue::Bool(b) => write!(f, "{}", b),
            MetadataValue::Integer(i) => write!(f, "{}", i),
            MetadataValue::Float(x) => write!(f, "{}", x),
            MetadataValue::Text(s) => f.write_str(s),
        }
    }
}

/// Fragment metadata, ordered by key
pub type Metadata = BTreeMap<String, MetadataValue>;

/// A cited piece of retrieved text
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub text: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl Source {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: Metadata::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Binary relevance verdict for retrieved content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DocumentGrade {
    /// Whether the document is relevant to the question
    pub is_relevant: bool,
}

impl DocumentGrade {
    pub fn relevant() -> Self {
        Self { is_relevant: true }
    }

    pub fn irrelevant() -> Self {
        Self { is_relevant: false }
    }

    /// JSON schema handed to the model in structured mode
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "is_relevant": {
                    "type": "boolean",
                    "description": "Whether the document is relevant to the question."
                }
            },
            "required": ["is_relevant"]
        })
    }
}

/// Result of a query, returned by both the graph and the simple service
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Final answer text
    pub message: Option<String>,

    /// Extra context on how the answer was reached
    pub reasoning: Option<String>,

    /// Fragments the answer is grounded on
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl QueryResponse {
    /// Response carrying an answer and its sources
    pub fn answer(message: impl Into<String>, sources: Vec<Source>) -> Self {
        Self {
            message: Some(message.into()),
            reasoning: None,
            sources,
        }
    }

    /// Response carrying sources only
    pub fn sources_only(sources: Vec<Source>) -> Self {
        Self {
            message: None,
            reasoning: None,
            sources,
        }
    }

    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = Some(reasoning.into());
        self
    }
}
