// Upstream HTTP client - plain GET with a per-request timeout, no retries

use crate::config::UpstreamConfig;
use crate::error::{GatewayError, Result};
use crate::metrics;
use crate::utils::logging::sanitize;
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Longest slice of an upstream error body carried into the error message.
const ERROR_BODY_LIMIT: usize = 500;

/// Shared HTTP client for all upstream providers.
#[derive(Clone)]
pub struct UpstreamClient {
    http: Client,
    sanitize_logs: bool,
}

impl UpstreamClient {
    pub fn new(config: &UpstreamConfig, sanitize_logs: bool) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .connect_timeout(Duration::from_secs(10))
            .pool_idle_timeout(Duration::from_secs(90))
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .use_rustls_tls()
            .build()
            .map_err(|e| GatewayError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            sanitize_logs,
        })
    }

    /// GET `url` with `query` appended and return the body as text.
    ///
    /// `upstream` names the provider in logs and metrics.
    pub async fn get_text(
        &self,
        upstream: &str,
        url: &str,
        query: &[(String, String)],
    ) -> Result<String> {
        let request = self
            .http
            .get(url)
            .query(query)
            .build()
            .map_err(|e| GatewayError::InvalidRequest(format!("cannot build upstream request: {}", e)))?;

        debug!("[{}] GET {}", upstream, self.loggable(request.url().as_str()));
        let started = Instant::now();

        let response = match self.http.execute(request).await {
            Ok(response) => response,
            Err(e) => {
                metrics::record_upstream_call(upstream, "network_error", started.elapsed().as_secs_f64());
                warn!("[{}] request failed: {}", upstream, self.loggable(&e.to_string()));
                let reason = if e.is_timeout() { "timed out" } else { "unreachable" };
                return Err(GatewayError::Upstream(format!("{} {}", upstream, reason)));
            }
        };

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            GatewayError::Upstream(format!("{} body could not be read: {}", upstream, e))
        })?;

        if !status.is_success() {
            metrics::record_upstream_call(upstream, "http_error", started.elapsed().as_secs_f64());
            warn!("[{}] returned HTTP {}", upstream, status.as_u16());
            return Err(GatewayError::UpstreamStatus {
                status: status.as_u16(),
                body: truncate(&body, ERROR_BODY_LIMIT).to_string(),
            });
        }

        metrics::record_upstream_call(upstream, "ok", started.elapsed().as_secs_f64());
        debug!("[{}] {} bytes in {:?}", upstream, body.len(), started.elapsed());
        Ok(body)
    }

    fn loggable(&self, text: &str) -> String {
        if self.sanitize_logs {
            sanitize(text)
        } else {
            text.to_string()
        }
    }
}

fn truncate(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
