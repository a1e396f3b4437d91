//! Structured logging and log-sanitization utilities.
//!
//! This module configures the `tracing` ecosystem for the application and
//! keeps portal service keys out of log sinks.

use crate::config::LoggingConfig;
use crate::error::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Query parameter names whose values never reach the logs.
const SECRET_PARAMS: [&str; 2] = ["serviceKey=", "ServiceKey="];

/// Initializes the global tracing subscriber for the application.
///
/// Supports three output formats:
/// - `json`: Structured JSON logs for production ingestion.
/// - `compact`: Single-line human-readable output.
/// - `pretty` (default): Multi-line, colorized output for development.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
        "compact" => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().compact())
                .init();
        }
        _ => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
    }

    Ok(())
}

/// Replaces service key values in URLs and messages with `[REDACTED]`.
///
/// The value runs until the next `&`, whitespace, or quote character.
pub fn sanitize(input: &str) -> String {
    let mut result = input.to_string();

    for param in SECRET_PARAMS {
        let mut search_from = 0;
        while let Some(rel) = result[search_from..].find(param) {
            let start = search_from + rel + param.len();
            let end = result[start..]
                .find(|c: char| c == '&' || c.is_whitespace() || c == '"' || c == '\'')
                .map(|i| start + i)
                .unwrap_or(result.len());
            result.replace_range(start..end, "[REDACTED]");
            search_from = start + "[REDACTED]".len();
        }
    }

    result
}
