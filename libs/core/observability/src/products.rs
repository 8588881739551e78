//! Product catalogue metrics.

use metrics::{counter, histogram};

/// Result of a stock mutation, used as the `outcome` label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StockOutcome {
    Applied,
    Insufficient,
    NotFound,
}

impl StockOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Insufficient => "insufficient",
            Self::NotFound => "not_found",
        }
    }
}

/// Product metrics recorder
pub struct ProductMetrics;

impl ProductMetrics {
    pub fn record_created(category: &str) {
        counter!(
            "product_operations_total",
            "operation" => "create",
            "category" => category.to_string()
        )
        .increment(1);
    }

    pub fn record_updated(mode: &'static str) {
        counter!("product_operations_total", "operation" => mode).increment(1);
    }

    /// `operation` is `increment`, `decrement` or `set`.
    pub fn record_stock_mutation(operation: &'static str, outcome: StockOutcome) {
        counter!(
            "product_stock_mutations_total",
            "operation" => operation,
            "outcome" => outcome.as_str()
        )
        .increment(1);

        if outcome == StockOutcome::Insufficient {
            tracing::debug!(operation, "Stock guard rejected mutation");
        }
    }

    pub fn record_deleted(count: u64) {
        counter!("products_deleted_total").increment(count);
    }

    /// `kind` is `list` or `search`.
    pub fn record_query(kind: &'static str, returned: usize, duration_ms: u64) {
        counter!("product_operations_total", "operation" => kind).increment(1);
        histogram!("product_query_duration_seconds", "kind" => kind)
            .record(duration_ms as f64 / 1000.0);

        tracing::debug!(kind, returned, duration_ms, "Product query completed");
    }
}
