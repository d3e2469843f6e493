//! Prometheus metrics: `lazy_static!` + `register_*_vec!` gauges and a
//! `TextEncoder`-based handler, labeled by HTTP route and provider since
//! this gateway's ingress is HTTP, not gRPC. `gateway-server`'s own axum
//! middleware calls `record_gateway_request` per request rather than
//! wrapping a tower `Service`.

use error_stack::ResultExt;
use lazy_static::lazy_static;
use prometheus::{
    self, register_histogram_vec, register_int_counter_vec, Encoder, HistogramVec, IntCounterVec,
    TextEncoder,
};

const LATENCY_BUCKETS: &[f64] = &[0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0];

lazy_static! {
    pub static ref GATEWAY_REQUESTS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gateway_http_requests_total",
        "Total number of ingress HTTP requests received",
        &["method", "route"]
    )
    .unwrap();
    pub static ref GATEWAY_REQUESTS_SUCCESSFUL: IntCounterVec = register_int_counter_vec!(
        "gateway_http_requests_successful",
        "Total number of ingress HTTP requests that returned a 2xx status",
        &["method", "route"]
    )
    .unwrap();
    pub static ref GATEWAY_REQUEST_LATENCY: HistogramVec = register_histogram_vec!(
        "gateway_http_request_latency_seconds",
        "Ingress HTTP request latency in seconds",
        &["method", "route"],
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap();
    pub static ref PROVIDER_API_CALLS_TOTAL: IntCounterVec = register_int_counter_vec!(
        "gateway_provider_api_calls_total",
        "Total number of outbound calls to a payment provider",
        &["provider", "endpoint"]
    )
    .unwrap();
    pub static ref PROVIDER_API_CALLS_LATENCY: HistogramVec = register_histogram_vec!(
        "gateway_provider_api_calls_latency_seconds",
        "Latency of outbound calls to a payment provider",
        &["provider", "endpoint"],
        LATENCY_BUCKETS.to_vec()
    )
    .unwrap();
    pub static ref PROVIDER_API_CALLS_ERRORS: IntCounterVec = register_int_counter_vec!(
        "gateway_provider_api_calls_errors_total",
        "Total number of failed outbound calls to a payment provider",
        &["provider", "endpoint"]
    )
    .unwrap();
}

/// Records one outbound provider call (driver `call()` helpers go through
/// `http_client.rs`'s shared executor, which is where this is invoked from).
pub fn record_provider_call(provider: &str, endpoint: &str, duration_seconds: f64, succeeded: bool) {
    PROVIDER_API_CALLS_TOTAL.with_label_values(&[provider, endpoint]).inc();
    PROVIDER_API_CALLS_LATENCY
        .with_label_values(&[provider, endpoint])
        .observe(duration_seconds);
    if !succeeded {
        PROVIDER_API_CALLS_ERRORS.with_label_values(&[provider, endpoint]).inc();
    }
}

/// Records one ingress HTTP request, called from `gateway-server`'s axum
/// middleware once the response status is known.
pub fn record_gateway_request(method: &str, route: &str, duration_seconds: f64, status_is_success: bool) {
    GATEWAY_REQUESTS_TOTAL.with_label_values(&[method, route]).inc();
    if status_is_success {
        GATEWAY_REQUESTS_SUCCESSFUL.with_label_values(&[method, route]).inc();
    }
    GATEWAY_REQUEST_LATENCY.with_label_values(&[method, route]).observe(duration_seconds);
}

pub async fn metrics_handler() -> error_stack::Result<String, MetricsError> {
    let mut buffer = Vec::new();
    let encoder = TextEncoder::new();
    let metric_families = prometheus::gather();
    encoder
        .encode(&metric_families, &mut buffer)
        .change_context(MetricsError::EncodingError)?;
    String::from_utf8(buffer).change_context(MetricsError::Utf8Error)
}

#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    #[error("error encoding metrics")]
    EncodingError,
    #[error("error converting metrics to utf8")]
    Utf8Error,
}
