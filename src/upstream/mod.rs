//! Upstream providers behind the gateway.
//!
//! - `client`: shared HTTP client (timeouts, status handling, metrics).
//! - `forest`: open-data forest point API, XML reshaped to JSON.
//! - `pages`: configured HTML pages reduced to plain text via CSS selectors.

pub mod client;
pub mod forest;
pub mod pages;

pub use client::UpstreamClient;
pub use forest::{to_canonical_json, ForestPointQuery};
pub use pages::{extract_text, page_fingerprint};
