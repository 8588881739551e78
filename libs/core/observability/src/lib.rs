//! Observability utilities for the products services.
//!
//! - Prometheus recorder and `/metrics` rendering
//! - HTTP request counters and latency histograms ([`middleware`])
//! - Product inventory counters ([`ProductMetrics`])
//!
//! ```rust,ignore
//! use observability::{init_metrics, metrics_handler, metrics_middleware};
//!
//! init_metrics()?;
//!
//! let app = Router::new()
//!     .route("/metrics", get(metrics_handler))
//!     .layer(axum::middleware::from_fn(metrics_middleware));
//! ```

pub mod middleware;
pub mod products;

pub use middleware::metrics_middleware;
pub use products::{ProductMetrics, StockOutcome};

// Re-export metrics macros for convenience
pub use metrics::{counter, gauge, histogram};

pub use metrics_exporter_prometheus::BuildError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use tracing::info;

static METRICS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the global Prometheus recorder. Later calls return the same handle.
pub fn init_metrics() -> Result<&'static PrometheusHandle, BuildError> {
    METRICS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new().install_recorder()?;
        info!("Prometheus metrics recorder initialized");
        register_metric_descriptions();
        Ok(handle)
    })
}

pub fn get_metrics_handle() -> Option<&'static PrometheusHandle> {
    METRICS_HANDLE.get()
}

/// Axum handler for /metrics endpoint
pub async fn metrics_handler() -> String {
    match get_metrics_handle() {
        Some(handle) => handle.render(),
        None => "# Metrics not initialized\n".to_string(),
    }
}

fn register_metric_descriptions() {
    use metrics::{describe_counter, describe_histogram};

    // HTTP metrics
    describe_counter!("http_requests_total", "Total number of HTTP requests");
    describe_histogram!(
        "http_request_duration_seconds",
        "HTTP request duration in seconds"
    );
    describe_counter!(
        "http_requests_errors_total",
        "Total number of HTTP request errors"
    );

    // Product metrics
    describe_counter!(
        "product_operations_total",
        "Product catalogue operations by type"
    );
    describe_counter!(
        "product_stock_mutations_total",
        "Stock mutations by operation and outcome"
    );
    describe_counter!("products_deleted_total", "Products removed by delete and bulk delete");
    describe_histogram!(
        "product_query_duration_seconds",
        "Duration of list and search queries"
    );
}
