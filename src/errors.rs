//! Error types for agentic-rag
//!
//! One error enum for the whole crate. Port failures are carried through
//! unchanged so callers of the graph see the dependency that broke.

use thiserror::Error;

/// Main error type for retrieval, model calls and graph execution
#[derive(Error, Debug)]
pub enum RagError {
    /// Graph transition errors
    #[error("Invalid graph transition from {from} to {to}: {reason}")]
    InvalidTransition {
        from: String,
        to: String,
        reason: String,
    },

    /// Model port errors (unreachable, non-success status, bad payload)
    #[error("Model API error: {0}")]
    ModelApiError(String),

    /// Retrieval port errors
    #[error("Retrieval failed: {0}")]
    RetrievalError(String),

    /// Structured output did not match the requested shape
    #[error("Contract violation: {0}")]
    ContractViolation(String),

    /// The agent asked for an unknown tool or gave unusable arguments
    #[error("Malformed tool call '{tool}': {reason}")]
    MalformedToolCall { tool: String, reason: String },

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Generic errors with context
    #[error("Error: {0}")]
    Generic(String),
}

/// Result type alias for crate operations
pub type Result<T> = std::result::Result<T, RagError>;

/// Convert anyhow errors to RagError
impl From<anyhow::Error> for RagError {
    fn from(err: anyhow::Error) -> Self {
        RagError::Generic(err.to_string())
    }
}

impl RagError {
    /// Whether this error came from one of the external ports
    pub fn is_dependency_failure(&self) -> bool {
        matches!(
            self,
            RagError::ModelApiError(_) | RagError::RetrievalError(_) | RagError::HttpError(_)
        )
    }

    /// Whether this error is a broken model contract (structured output or tool call)
    pub fn is_contract_violation(&self) -> bool {
        matches!(
            self,
            RagError::ContractViolation(_) | RagError::MalformedToolCall { .. }
        )
    }
}
