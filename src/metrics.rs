// Copyright (c) 2025 Erick Bourgeois, firestoned
// SPDX-License-Identifier: MIT

//! Prometheus metrics for the ibdns operator.
//!
//! All metrics carry the `ibdns_` namespace prefix and live in
//! [`METRICS_REGISTRY`], which the binary serves on `/metrics`.
//!
//! # Metrics Categories
//!
//! - **Reconciliation Metrics** - Lifecycle operations and their outcomes
//! - **Backend Metrics** - Record mutations and raw WAPI requests
//! - **Error Metrics** - Failures by status reason
//!
//! # Example
//!
//! ```rust,no_run
//! use ibdns::metrics::record_reconciliation_success;
//!
//! record_reconciliation_success("Reconcile", std::time::Duration::from_millis(120));
//! ```

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::sync::LazyLock;
use std::time::Duration;

/// Namespace prefix for all ibdns metrics
const METRICS_NAMESPACE: &str = "ibdns";

/// Global Prometheus metrics registry
pub static METRICS_REGISTRY: LazyLock<Registry> = LazyLock::new(Registry::new);

fn register_counter(name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let opts = Opts::new(format!("{METRICS_NAMESPACE}_{name}"), help);
    let counter = CounterVec::new(opts, labels).unwrap();
    METRICS_REGISTRY
        .register(Box::new(counter.clone()))
        .unwrap();
    counter
}

fn register_histogram(name: &str, help: &str, labels: &[&str], buckets: Vec<f64>) -> HistogramVec {
    let opts = HistogramOpts::new(format!("{METRICS_NAMESPACE}_{name}"), help).buckets(buckets);
    let histogram = HistogramVec::new(opts, labels).unwrap();
    METRICS_REGISTRY
        .register(Box::new(histogram.clone()))
        .unwrap();
    histogram
}

// ============================================================================
// Reconciliation Metrics
// ============================================================================

/// Total number of lifecycle operations by operation and status
///
/// Labels:
/// - `operation`: `Create`, `Reconcile`, `Restore`, `Migrate` or `Delete`
/// - `status`: `success` or `error`
pub static RECONCILIATION_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "reconciliations_total",
        "Total number of DNSRecord operations by operation and status",
        &["operation", "status"],
    )
});

/// Duration of lifecycle operations in seconds
pub static RECONCILIATION_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram(
        "reconciliation_duration_seconds",
        "Duration of DNSRecord operations in seconds by operation",
        &["operation"],
        vec![0.01, 0.1, 0.5, 1.0, 2.0, 5.0, 10.0, 30.0, 60.0],
    )
});

// ============================================================================
// Backend Metrics
// ============================================================================

/// Backend record mutations
///
/// Labels:
/// - `record_type`: `A`, `AAAA`, `CNAME` or `TXT`
/// - `kind`: `create` or `delete`
/// - `status`: `success` or `error`
pub static BACKEND_MUTATIONS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "backend_mutations_total",
        "Total number of record creations and deletions sent to the DNS backend",
        &["record_type", "kind", "status"],
    )
});

/// WAPI requests by HTTP method and response status (`error` for transport failures)
pub static WAPI_REQUESTS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "wapi_requests_total",
        "Total number of Infoblox WAPI requests by method and status",
        &["method", "status"],
    )
});

/// WAPI request latency in seconds
pub static WAPI_REQUEST_DURATION_SECONDS: LazyLock<HistogramVec> = LazyLock::new(|| {
    register_histogram(
        "wapi_request_duration_seconds",
        "Latency of Infoblox WAPI requests in seconds by method",
        &["method"],
        vec![0.005, 0.025, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 60.0],
    )
});

// ============================================================================
// Error Metrics
// ============================================================================

/// Failures by operation and status reason (e.g., `NoMatchingZone`)
pub static ERRORS_TOTAL: LazyLock<CounterVec> = LazyLock::new(|| {
    register_counter(
        "errors_total",
        "Total number of failed DNSRecord operations by status reason",
        &["operation", "reason"],
    )
});

// ============================================================================
// Helper Functions
// ============================================================================

fn status_label(success: bool) -> &'static str {
    if success {
        "success"
    } else {
        "error"
    }
}

/// Record a successful lifecycle operation
pub fn record_reconciliation_success(operation: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "success"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
}

/// Record a failed lifecycle operation
///
/// # Arguments
/// * `operation` - The lifecycle operation that failed
/// * `reason` - Status reason of the failure
/// * `duration` - Duration of the operation before failure
pub fn record_reconciliation_error(operation: &str, reason: &str, duration: Duration) {
    RECONCILIATION_TOTAL
        .with_label_values(&[operation, "error"])
        .inc();
    RECONCILIATION_DURATION_SECONDS
        .with_label_values(&[operation])
        .observe(duration.as_secs_f64());
    ERRORS_TOTAL.with_label_values(&[operation, reason]).inc();
}

/// Record one record creation or deletion against the backend
pub fn record_backend_mutation(record_type: &str, kind: &str, success: bool) {
    BACKEND_MUTATIONS_TOTAL
        .with_label_values(&[record_type, kind, status_label(success)])
        .inc();
}

/// Record one WAPI round trip
pub fn record_wapi_request(method: &str, status: &str, duration: Duration) {
    WAPI_REQUESTS_TOTAL
        .with_label_values(&[method, status])
        .inc();
    WAPI_REQUEST_DURATION_SECONDS
        .with_label_values(&[method])
        .observe(duration.as_secs_f64());
}

/// Gather and encode all metrics in Prometheus text format
///
/// # Errors
/// Returns error if encoding fails
pub fn gather_metrics() -> Result<String, prometheus::Error> {
    let encoder = TextEncoder::new();
    let metric_families = METRICS_REGISTRY.gather();
    let mut buffer = Vec::new();
    encoder.encode(&metric_families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(format!("UTF-8 error: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_reconciliation_success() {
        record_reconciliation_success("TestReconcile", Duration::from_millis(500));

        let counter = RECONCILIATION_TOTAL.with_label_values(&["TestReconcile", "success"]);
        assert!(counter.get() > 0.0);

        let histogram = RECONCILIATION_DURATION_SECONDS.with_label_values(&["TestReconcile"]);
        assert!(histogram.get_sample_count() > 0);
    }

    #[test]
    fn test_record_reconciliation_error_counts_reason() {
        record_reconciliation_error("TestDelete", "BackendUnreachable", Duration::from_millis(5));

        let counter = RECONCILIATION_TOTAL.with_label_values(&["TestDelete", "error"]);
        assert!(counter.get() > 0.0);

        let errors = ERRORS_TOTAL.with_label_values(&["TestDelete", "BackendUnreachable"]);
        assert!(errors.get() > 0.0);
    }

    #[test]
    fn test_record_backend_mutation_labels() {
        record_backend_mutation("CNAME", "create", false);

        let counter = BACKEND_MUTATIONS_TOTAL.with_label_values(&["CNAME", "create", "error"]);
        assert!(counter.get() > 0.0);
    }

    #[test]
    fn test_gather_metrics() {
        record_reconciliation_success("GatherTest", Duration::from_millis(100));
        record_wapi_request("GET", "200", Duration::from_millis(20));

        let metrics_text = gather_metrics().unwrap();
        assert!(metrics_text.contains("ibdns_reconciliations_total"));
        assert!(metrics_text.contains("ibdns_wapi_requests_total"));
    }
}
