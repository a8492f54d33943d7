//! Agent tools
//!
//! Tool declarations, the registry the agent dispatches through, and the
//! retrieval tool.

pub mod registry;
pub mod retrieve;
pub mod types;

pub use registry::ToolRegistry;
pub use retrieve::{retrieve_tool_schema, RetrieveTool, RETRIEVE_TOOL};
pub use types::{Tool, ToolSchema};
