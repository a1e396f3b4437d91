// Metrics module for Prometheus observability

mod registry;

pub use registry::{
    gather_metrics,
    COUNTER_ENTRIES,
    PROMOTION_OPERATIONS,
    REQUESTS_TOTAL,
    REQUEST_DURATION,
    UPSTREAM_CALLS,
    UPSTREAM_DURATION,
};

/// Helper to record request metrics
pub fn record_request(method: &str, endpoint: &str, status_code: u16, duration_secs: f64) {
    let status = status_code.to_string();

    REQUESTS_TOTAL
        .with_label_values(&[method, endpoint, &status])
        .inc();

    REQUEST_DURATION
        .with_label_values(&[method, endpoint, &status])
        .observe(duration_secs);
}

/// Helper to record upstream call metrics
pub fn record_upstream_call(upstream: &str, outcome: &str, duration_secs: f64) {
    UPSTREAM_CALLS.with_label_values(&[upstream, outcome]).inc();

    UPSTREAM_DURATION
        .with_label_values(&[upstream])
        .observe(duration_secs);
}

/// Helper to record promotion cache operations (hit, miss, promote, store_error)
pub fn record_promotion_op(route: &str, operation: &str) {
    PROMOTION_OPERATIONS
        .with_label_values(&[route, operation])
        .inc();
}

pub fn update_counter_entries(count: usize) {
    COUNTER_ENTRIES.with_label_values(&["tracked"]).set(count as f64);
}
