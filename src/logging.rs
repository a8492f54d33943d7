//! Tracing subscriber setup for the binary
//!
//! Level resolution, highest precedence first:
//! - `-q` / `-v` / `-vv` flags
//! - `RUST_LOG`
//! - `[logging].level` from the config file
//!
//! Logs go to stderr so `--json` output on stdout stays machine-readable.

use crate::cli::Verbosity;
use crate::config::LoggingConfig;
use crate::errors::{RagError, Result};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Filter directive implied by the verbosity flags, if any
pub fn flag_filter(verbosity: Verbosity) -> Option<&'static str> {
    match verbosity {
        Verbosity::Quiet => Some("error"),
        Verbosity::Normal => None,
        Verbosity::Verbose => Some("debug"),
        Verbosity::VeryVerbose => Some("trace"),
    }
}

/// Resolve the filter directive from flags, `RUST_LOG` and config
pub fn resolve_filter(verbosity: Verbosity, rust_log: Option<&str>, config: &LoggingConfig) -> String {
    if let Some(filter) = flag_filter(verbosity) {
        return filter.to_string();
    }

    match rust_log {
        Some(directive) if !directive.trim().is_empty() => directive.to_string(),
        _ => config.level.clone(),
    }
}

/// Install the global subscriber
pub fn init(verbosity: Verbosity, config: &LoggingConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let directive = resolve_filter(verbosity, rust_log.as_deref(), config);

    let filter = EnvFilter::try_new(&directive)
        .map_err(|e| RagError::ConfigError(format!("Invalid log filter '{}': {}", directive, e)))?;

    let text_layer = (!config.json).then(|| {
        fmt::layer()
            .with_target(false)
            .with_writer(std::io::stderr)
    });
    let json_layer = config
        .json
        .then(|| fmt::layer().json().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(text_layer)
        .with(json_layer)
        .try_init()
        .map_err(|e| RagError::Generic(format!("Failed to install tracing subscriber: {}", e)))
}
