//! CLI module for agentic-rag
//!
//! Handles command-line argument parsing and response rendering.

pub mod args;
pub mod output;

pub use args::{Args, Commands, Verbosity};
