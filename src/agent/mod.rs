//! Agentic retrieval graph
//!
//! Core graph components: state machine, conversation log, nodes, and the
//! orchestrator that runs them.

pub mod conversation;
pub mod nodes;
pub mod orchestrator;
pub mod state;

// Re-export commonly used types
pub use conversation::Conversation;
pub use orchestrator::{
    GraphConfig, GraphPorts, GraphRun, RagGraph, RunOutcome, DEFAULT_MAX_REWRITES,
};
pub use state::{GraphEvent, GraphNode};
