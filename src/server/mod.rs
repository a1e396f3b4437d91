//! Axum-based HTTP server for the oag gateway.
//!
//! # Components
//!
//! - `handlers`: Endpoint implementations (open-data proxy, page scraping, health, docs, metrics).
//! - `middleware`: Request ID propagation and per-route request metrics.
//! - `routes`: Shared state and the router that ties everything together.

mod handlers;
mod middleware;
mod routes;

pub use routes::{build_router, create_router, AppState};
