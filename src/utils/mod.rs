//! Utility functions and helpers for the oag gateway.
//!
//! - `logging`: Tracing initialization and secret redaction for log lines.

pub mod logging;
