//! Type definitions module
//!
//! Core types for graph conversations and query responses.

pub mod messages;
pub mod response;

// Re-export commonly used types
pub use messages::{Role, ToolCall, Turn};
pub use response::{DocumentGrade, Metadata, MetadataValue, QueryResponse, Source};
