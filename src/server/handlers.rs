// HTTP request handlers

use super::routes::AppState;
use crate::cache::{CacheStats, Resolution};
use crate::error::{GatewayError, Result};
use crate::upstream::{extract_text, page_fingerprint, to_canonical_json, ForestPointQuery};
use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderName, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use tracing::debug;

const CACHE_HEADER: HeaderName = HeaderName::from_static("x-oag-cache");
const HIT_COUNT_HEADER: HeaderName = HeaderName::from_static("x-oag-hit-count");

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub checks: HashMap<String, HealthCheck>,
    pub timestamp: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthCheck {
    pub status: String,
    pub message: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ShowQuery {
    #[serde(default)]
    pub team: String,
    #[serde(default)]
    pub member: String,
}

pub async fn root_handler() -> &'static str {
    "Hello, World!"
}

pub async fn user_handler(Path(id): Path<String>) -> String {
    id
}

pub async fn show_handler(Query(query): Query<ShowQuery>) -> String {
    format!("team:{}, member:{}", query.team, query.member)
}

/// Handler for /forestPoint (open-data forest fire danger points)
pub async fn forest_point_handler(
    State(state): State<AppState>,
    Query(query): Query<ForestPointQuery>,
) -> Result<Response> {
    let service_key = &state.config.upstream.service_key;
    let fp = query.fingerprint(service_key);
    let params = query.upstream_params(service_key);
    let url = state.config.upstream.forest_point_url.clone();
    let upstream = state.upstream.clone();

    debug!(
        "forestPoint request: pageNo={} numOfRows={} fingerprint={}",
        query.page_no,
        query.num_of_rows,
        fp.short_id()
    );

    let resolution = state
        .forest_cache
        .resolve(&fp, || async move {
            let raw = upstream.get_text("forest_point", &url, &params).await?;
            to_canonical_json(&raw)
        })
        .await?;

    Ok(payload_response(resolution, "application/json; charset=utf-8"))
}

/// Handler for /pages/:name (scraped HTML pages)
pub async fn page_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<Vec<(String, String)>>,
) -> Result<Response> {
    let source = state
        .config
        .upstream
        .html_source(&name)
        .cloned()
        .ok_or_else(|| GatewayError::NotFound(format!("no page named {}", name)))?;

    let fp = page_fingerprint(&source, &query);
    let upstream = state.upstream.clone();

    let resolution = state
        .page_cache
        .resolve(&fp, || async move {
            let html = upstream.get_text(&source.name, &source.url, &query).await?;
            extract_text(&html, &source.selector)
        })
        .await?;

    Ok(payload_response(resolution, "text/plain; charset=utf-8"))
}

fn payload_response(resolution: Resolution, content_type: &'static str) -> Response {
    let status = resolution.cache_status();
    let count = resolution.hit_count();

    let mut response = (
        StatusCode::OK,
        [(header::CONTENT_TYPE, content_type)],
        resolution.payload,
    )
        .into_response();

    let headers = response.headers_mut();
    headers.insert(CACHE_HEADER, HeaderValue::from_static(status));
    if let Some(count) = count {
        headers.insert(HIT_COUNT_HEADER, HeaderValue::from(count));
    }
    response
}

pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let mut checks = HashMap::new();
    let mut overall_status = HealthStatus::Healthy;

    // Store reachability; an unreachable store only degrades service
    let store_check = match state.store.ping().await {
        Ok(()) => HealthCheck {
            status: "ok".to_string(),
            message: format!("{} reachable", state.store.backend()),
        },
        Err(e) => {
            overall_status = HealthStatus::Degraded;
            HealthCheck {
                status: "warning".to_string(),
                message: format!("{}: {}, serving from upstream", state.store.backend(), e),
            }
        }
    };
    checks.insert("record_store".to_string(), store_check);

    checks.insert(
        "frequency_counter".to_string(),
        HealthCheck {
            status: "ok".to_string(),
            message: format!("{} fingerprints tracked", state.counter.len()),
        },
    );

    for cache in [&state.forest_cache, &state.page_cache] {
        checks.insert(
            format!("promotion_{}", cache.route()),
            HealthCheck {
                status: "ok".to_string(),
                message: describe_stats(cache.threshold(), &cache.stats()),
            },
        );
    }

    Json(HealthResponse {
        status: overall_status,
        checks,
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

fn describe_stats(threshold: u64, stats: &CacheStats) -> String {
    format!(
        "threshold {}: {} hits, {} misses, {} promotions, {} store errors",
        threshold, stats.hits, stats.misses, stats.promotions, stats.store_errors
    )
}

/// Route index (the gateway's API documentation)
pub async fn docs_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let pages: Vec<serde_json::Value> = state
        .config
        .upstream
        .html_sources
        .iter()
        .map(|s| json!({ "path": format!("/pages/{}", s.name), "selector": s.selector }))
        .collect();

    Json(json!({
        "title": "Open API Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "routes": [
            { "method": "GET", "path": "/", "description": "Greeting" },
            { "method": "GET", "path": "/users/:id", "description": "Echo the user id" },
            { "method": "GET", "path": "/show", "params": ["team", "member"], "description": "Echo team and member" },
            {
                "method": "GET",
                "path": "/forestPoint",
                "params": ["pageNo", "numOfRows", "_type", "excludeForecast"],
                "description": "Forest fire danger points as JSON",
                "promotion_threshold": state.forest_cache.threshold()
            },
            {
                "method": "GET",
                "path": "/pages/:name",
                "description": "Text scraped from a configured HTML page",
                "promotion_threshold": state.page_cache.threshold(),
                "pages": pages
            },
            { "method": "GET", "path": "/health", "description": "Health report" },
            { "method": "GET", "path": "/metrics", "description": "Prometheus metrics" }
        ]
    }))
}

pub async fn metrics_handler() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        crate::metrics::gather_metrics(),
    )
}
