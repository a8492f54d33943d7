//! Command-line argument parsing for agentic-rag
//!
//! Provides clap-based CLI with subcommands and verbosity control.

use crate::config::Config;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// agentic-rag - Answer questions over an indexed corpus
#[derive(Parser, Debug)]
#[command(name = "agentic-rag")]
#[command(author = "Jerome (Kubashen) Naidoo")]
#[command(version)]
#[command(
    about = "Answer questions over an indexed corpus with a retrieve/grade/rewrite loop",
    long_about = None
)]
pub struct Args {
    /// Configuration file path (~/.agentic-rag/config.toml by default)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Print the response as pretty JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbosity level: -q (quiet), default (normal), -v (verbose), -vv (very verbose)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Quiet mode (suppress everything except the response)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Override `[graph].max_rewrites`
    #[arg(long, global = true, value_name = "N")]
    pub max_rewrites: Option<usize>,

    /// Subcommand
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Answer through the agentic graph (retrieve, grade, rewrite)
    Ask {
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// Answer with a single retrieval and one model call
    Query {
        #[arg(value_name = "QUESTION")]
        question: String,
    },

    /// List the documents retrieved for a question, without answering
    Documents {
        #[arg(value_name = "QUESTION")]
        question: String,

        /// Number of documents to return (`[retrieval].documents_top_k` by default)
        #[arg(long)]
        top_k: Option<usize>,
    },

    /// Display the effective configuration
    Config,
}

/// Verbosity level enum
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verbosity {
    Quiet,
    Normal,
    Verbose,
    VeryVerbose,
}

impl Args {
    /// Get verbosity level based on flags
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::VeryVerbose,
            }
        }
    }

    /// Apply command-line overrides to a loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(max_rewrites) = self.max_rewrites {
            config.graph.max_rewrites = max_rewrites;
        }
    }
}

impl Verbosity {
    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Verbosity::Quiet => "quiet",
            Verbosity::Normal => "normal",
            Verbosity::Verbose => "verbose",
            Verbosity::VeryVerbose => "very_verbose",
        }
    }

    /// Whether to show the progress spinner
    pub fn show_progress(&self) -> bool {
        !matches!(self, Verbosity::Quiet)
    }
}
