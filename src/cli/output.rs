//! Terminal rendering of query responses
//!
//! Plain renderers return strings so they can be tested without a terminal;
//! colors are dropped automatically when stdout is not a tty.

use crate::cli::Verbosity;
use crate::errors::Result;
use crate::types::{QueryResponse, Source};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Characters of fragment text shown per source in text mode
const SOURCE_PREVIEW_CHARS: usize = 200;

/// Render a response as pretty JSON
pub fn render_json(response: &QueryResponse) -> Result<String> {
    Ok(serde_json::to_string_pretty(response)?)
}

/// Render a response as colored text
pub fn render_response(response: &QueryResponse) -> String {
    let mut out = String::new();

    if let Some(message) = &response.message {
        out.push_str(message);
        out.push('\n');
    }

    if let Some(reasoning) = &response.reasoning {
        out.push('\n');
        out.push_str(&format!("{} {}\n", "Note:".yellow().bold(), reasoning));
    }

    if !response.sources.is_empty() {
        out.push('\n');
        out.push_str(&render_sources(&response.sources));
    }

    out
}

/// Render a numbered source list with metadata and a text preview
pub fn render_sources(sources: &[Source]) -> String {
    let mut out = format!("{}\n", format!("Sources ({})", sources.len()).cyan().bold());

    for (i, source) in sources.iter().enumerate() {
        let label = source
            .metadata
            .iter()
            .map(|(key, value)| format!("{}={}", key, value))
            .collect::<Vec<_>>()
            .join(", ");

        if label.is_empty() {
            out.push_str(&format!("  [{}]\n", i + 1));
        } else {
            out.push_str(&format!("  [{}] {}\n", i + 1, label.dimmed()));
        }
        out.push_str(&format!("      {}\n", preview(&source.text, SOURCE_PREVIEW_CHARS)));
    }

    out
}

/// First `max_chars` characters on one line, with an ellipsis when cut
fn preview(text: &str, max_chars: usize) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");

    if flat.chars().count() <= max_chars {
        return flat;
    }

    let mut cut: String = flat.chars().take(max_chars).collect();
    cut.push('…');
    cut
}

/// Spinner shown while waiting on the model; `None` in quiet mode
pub fn spinner(message: &str, verbosity: Verbosity) -> Option<ProgressBar> {
    if !verbosity.show_progress() {
        return None;
    }

    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    Some(pb)
}
