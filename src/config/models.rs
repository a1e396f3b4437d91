//! Configuration data structures for the oag gateway.
//!
//! This module defines the schema for the application settings: the HTTP
//! listener, the persistent record store, the upstream providers and the
//! promotion thresholds applied per route.

use serde::{Deserialize, Serialize};

/// The root configuration object for the application.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AppConfig {
    /// HTTP server settings (host, port).
    #[serde(default)]
    pub server: ServerConfig,

    /// Persistent record store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Upstream provider settings.
    #[serde(default)]
    pub upstream: UpstreamConfig,

    /// Per-route promotion thresholds.
    #[serde(default)]
    pub promotion: PromotionConfig,

    /// Logging and observability settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Settings for the built-in HTTP server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The IP address or hostname the server should bind to.
    /// Default: `127.0.0.1`
    #[serde(default = "default_host")]
    pub host: String,

    /// The port number the server should listen on.
    /// Default: `5000`
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Settings for the MongoDB-backed record store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// When `false` promoted records are kept in process memory only.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Path to the JSON file holding host, port and credentials.
    /// Default: `./auth.json`
    #[serde(default = "default_credentials_path")]
    pub credentials_path: String,

    /// Database holding the records collection.
    /// Default: `oag`
    #[serde(default = "default_database")]
    pub database: String,

    /// Collection promoted records are written to.
    /// Default: `data`
    #[serde(default = "default_collection")]
    pub collection: String,

    /// Connection and per-operation timeout in seconds.
    /// Default: `3`
    #[serde(default = "default_store_timeout")]
    pub connect_timeout_seconds: u64,
}

/// A scraped HTML page exposed under `/pages/{name}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HtmlSource {
    /// Route segment identifying the page.
    pub name: String,
    /// Page URL; request query parameters are forwarded to it.
    pub url: String,
    /// CSS selector whose matching elements' text makes up the payload.
    pub selector: String,
}

/// Settings for the upstream providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpstreamConfig {
    /// Request timeout in seconds.
    /// Default: `60`
    #[serde(default = "default_upstream_timeout")]
    pub timeout_seconds: u64,

    /// Forest fire danger point endpoint of the open-data portal.
    #[serde(default = "default_forest_point_url")]
    pub forest_point_url: String,

    /// Portal service key, as issued (percent-encoded form is accepted).
    #[serde(default)]
    pub service_key: String,

    /// HTML pages available for scraping.
    #[serde(default = "default_html_sources")]
    pub html_sources: Vec<HtmlSource>,
}

/// Promotion thresholds: the hit count at which a response is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromotionConfig {
    /// Default: `5`
    #[serde(default = "default_forest_point_threshold")]
    pub forest_point_threshold: u64,

    /// Default: `30`
    #[serde(default = "default_html_threshold")]
    pub html_threshold: u64,
}

/// Settings for application logging and output format.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Minimum log level (`trace`, `debug`, `info`, `warn`, `error`).
    /// Default: `info`
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format for logs (`pretty`, `json`, `compact`).
    /// Default: `pretty`
    #[serde(default = "default_log_format")]
    pub format: String,

    /// Whether to mask service keys in logged URLs.
    /// Default: `true`
    #[serde(default = "default_true")]
    pub sanitize_keys: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            credentials_path: default_credentials_path(),
            database: default_database(),
            collection: default_collection(),
            connect_timeout_seconds: default_store_timeout(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: default_upstream_timeout(),
            forest_point_url: default_forest_point_url(),
            service_key: String::new(),
            html_sources: default_html_sources(),
        }
    }
}

impl Default for PromotionConfig {
    fn default() -> Self {
        Self {
            forest_point_threshold: default_forest_point_threshold(),
            html_threshold: default_html_threshold(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            sanitize_keys: true,
        }
    }
}

impl UpstreamConfig {
    /// Look up a configured HTML page by its route name.
    pub fn html_source(&self, name: &str) -> Option<&HtmlSource> {
        self.html_sources.iter().find(|s| s.name == name)
    }
}

// Helper functions for serde defaults
fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    5000
}

fn default_true() -> bool {
    true
}

fn default_credentials_path() -> String {
    "./auth.json".to_string()
}

fn default_database() -> String {
    "oag".to_string()
}

fn default_collection() -> String {
    "data".to_string()
}

fn default_store_timeout() -> u64 {
    3
}

fn default_upstream_timeout() -> u64 {
    60
}

fn default_forest_point_url() -> String {
    "http://apis.data.go.kr/1400377/forestPoint/forestPointListGeongugSearch".to_string()
}

fn default_html_sources() -> Vec<HtmlSource> {
    vec![
        HtmlSource {
            name: "notices".to_string(),
            url: "https://www.forest.go.kr/kfsweb/kfi/kfs/cms/cmsView.do".to_string(),
            selector: "td.subject".to_string(),
        },
        HtmlSource {
            name: "forecast".to_string(),
            url: "https://www.weather.go.kr/w/weather/forecast/short-term.do".to_string(),
            selector: "div.cmp-view-announcement p".to_string(),
        },
    ]
}

fn default_forest_point_threshold() -> u64 {
    5
}

fn default_html_threshold() -> u64 {
    30
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}
