// HTTP routes configuration

use super::handlers::{
    docs_handler, forest_point_handler, health_handler, metrics_handler, page_handler,
    root_handler, show_handler, user_handler,
};
use super::middleware::{request_id_layers, track_metrics};
use crate::cache::{FrequencyCounter, PromotionCache, RecordStore};
use crate::config::AppConfig;
use crate::error::Result;
use crate::upstream::UpstreamClient;
use axum::{middleware::from_fn, routing::get, Router};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub upstream: UpstreamClient,
    pub store: Arc<dyn RecordStore>,
    pub counter: Arc<FrequencyCounter>,
    pub forest_cache: PromotionCache,
    pub page_cache: PromotionCache,
}

impl AppState {
    /// Wire the per-route promotion caches around one store and one counter.
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> Result<Self> {
        let upstream = UpstreamClient::new(&config.upstream, config.logging.sanitize_keys)?;
        let counter = Arc::new(FrequencyCounter::new());

        let forest_cache = PromotionCache::new(
            "forest_point",
            config.promotion.forest_point_threshold,
            Arc::clone(&store),
            Arc::clone(&counter),
        );
        let page_cache = PromotionCache::new(
            "pages",
            config.promotion.html_threshold,
            Arc::clone(&store),
            Arc::clone(&counter),
        );

        Ok(Self {
            config: Arc::new(config),
            upstream,
            store,
            counter,
            forest_cache,
            page_cache,
        })
    }
}

pub fn create_router(config: AppConfig, store: Arc<dyn RecordStore>) -> Result<Router> {
    Ok(build_router(AppState::new(config, store)?))
}

pub fn build_router(state: AppState) -> Router {
    let (set_request_id, propagate_request_id) = request_id_layers();

    Router::new()
        .route("/", get(root_handler))
        .route("/users/:id", get(user_handler))
        .route("/show", get(show_handler))
        .route("/forestPoint", get(forest_point_handler))
        .route("/pages/:name", get(page_handler))
        .route("/health", get(health_handler))
        .route("/docs", get(docs_handler))
        .route("/metrics", get(metrics_handler))
        .route_layer(from_fn(track_metrics))
        .layer(TraceLayer::new_for_http())
        .layer(propagate_request_id)
        .layer(set_request_id)
        .with_state(state)
}
