//! Metrics collection and observability types for the API service.

use prometheus::{Histogram, IntCounter, IntCounterVec};
use std::sync::Arc;
use std::time::Duration;

/// Service metrics for observability
#[derive(Debug)]
pub struct ServiceMetrics {
    // HTTP request metrics
    pub http_requests_total: IntCounter,
    pub http_request_duration: Histogram,
    pub http_request_size: Histogram,
    pub http_response_size: Histogram,

    // Chat interaction metrics
    pub interactions_total: IntCounterVec,
    pub interaction_duration_seconds: Histogram,
    pub signature_validation_failures: IntCounter,
    pub authentication_failures_total: IntCounter,

    // Search pipeline metrics
    pub searches_total: IntCounterVec,
    pub search_results_returned: Histogram,

    // Report metrics
    pub overflow_reports_total: IntCounter,
    pub report_downloads_total: IntCounter,
    pub report_download_failures: IntCounter,

    // Error metrics
    pub error_rate_by_category: IntCounterVec,
}

impl ServiceMetrics {
    pub fn new() -> Result<Arc<Self>, prometheus::Error> {
        use prometheus::{register_histogram, register_int_counter, register_int_counter_vec};

        Ok(Arc::new(Self {
            http_requests_total: register_int_counter!(
                "http_requests_total",
                "Total number of HTTP requests",
            )?,
            http_request_duration: register_histogram!(
                "http_request_duration_seconds",
                "HTTP request processing time",
                vec![0.001, 0.01, 0.1, 1.0, 10.0]
            )?,
            http_request_size: register_histogram!(
                "http_request_size_bytes",
                "HTTP request size in bytes",
                vec![100.0, 1000.0, 10000.0, 100000.0, 1000000.0]
            )?,
            http_response_size: register_histogram!(
                "http_response_size_bytes",
                "HTTP response size in bytes",
                vec![100.0, 1000.0, 10000.0, 100000.0, 1000000.0]
            )?,

            interactions_total: register_int_counter_vec!(
                "interactions_total",
                "Chat commands processed per channel",
                &["channel", "command"]
            )?,
            interaction_duration_seconds: register_histogram!(
                "interaction_duration_seconds",
                "Chat command processing time distribution",
                vec![0.001, 0.01, 0.1, 0.5, 1.0, 2.0, 5.0]
            )?,
            signature_validation_failures: register_int_counter!(
                "signature_validation_failures",
                "Failed interaction signature validations"
            )?,
            authentication_failures_total: register_int_counter!(
                "authentication_failures_total",
                "Failed authentication attempts"
            )?,

            searches_total: register_int_counter_vec!(
                "searches_total",
                "Search operations grouped by outcome",
                &["outcome"]
            )?,
            search_results_returned: register_histogram!(
                "search_results_returned",
                "Results returned per completed search",
                vec![0.0, 1.0, 5.0, 10.0, 25.0, 100.0, 250.0]
            )?,

            overflow_reports_total: register_int_counter!(
                "overflow_reports_total",
                "Overflow reports exported for oversized result sets"
            )?,
            report_downloads_total: register_int_counter!(
                "report_downloads_total",
                "Report downloads served"
            )?,
            report_download_failures: register_int_counter!(
                "report_download_failures",
                "Report downloads that could not be served"
            )?,

            error_rate_by_category: register_int_counter_vec!(
                "error_rate_by_category",
                "Errors grouped by category and transience",
                &["category", "transient"]
            )?,
        }))
    }

    pub fn record_http_request(&self, duration: Duration, request_size: u64, response_size: u64) {
        self.http_requests_total.inc();
        self.http_request_duration.observe(duration.as_secs_f64());
        self.http_request_size.observe(request_size as f64);
        self.http_response_size.observe(response_size as f64);
    }

    pub fn record_interaction(&self, channel: &str, command: &str, duration: Duration) {
        self.interactions_total
            .with_label_values(&[channel, command])
            .inc();
        self.interaction_duration_seconds
            .observe(duration.as_secs_f64());
    }

    /// Count a rejected request; signature failures are tracked separately
    /// from bearer token mismatches
    pub fn record_authentication_failure(&self, signature_failure: bool) {
        self.authentication_failures_total.inc();
        if signature_failure {
            self.signature_validation_failures.inc();
        }
    }

    pub fn record_search_outcome(&self, outcome: &str, result_count: Option<u64>) {
        self.searches_total.with_label_values(&[outcome]).inc();
        if let Some(count) = result_count {
            self.search_results_returned.observe(count as f64);
        }
    }

    pub fn record_error(&self, category: &str, is_transient: bool) {
        let transient_label = if is_transient { "true" } else { "false" };
        self.error_rate_by_category
            .with_label_values(&[category, transient_label])
            .inc();
    }
}
