//! The `/metrics` endpoint served on the separate metrics listener, plus the
//! ingress middleware that records against it. The gauges themselves are
//! registered in `external-services::metrics` — every driver call and every
//! ingress route records against that one process-wide registry.

use axum::extract::{MatchedPath, Request};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;

pub async fn metrics_handler() -> Result<String, (StatusCode, String)> {
    external_services::metrics::metrics_handler().await.map_err(|error| {
        tracing::error!(%error, "error fetching metrics");
        (StatusCode::INTERNAL_SERVER_ERROR, "error fetching metrics".to_owned())
    })
}

/// Records one ingress request's method/route/latency/outcome against the
/// gateway-wide counters, keyed by the route's matched pattern (e.g.
/// `/v1/payments/{provider}`) rather than the literal path, so
/// per-tenant/per-payment-id cardinality never reaches Prometheus.
pub async fn record_request(request: Request, next: Next) -> Response {
    let method = request.method().to_string();
    let route = request
        .extensions()
        .get::<MatchedPath>()
        .map(|matched| matched.as_str().to_owned())
        .unwrap_or_else(|| request.uri().path().to_owned());

    let started_at = std::time::Instant::now();
    let response = next.run(request).await;

    external_services::metrics::record_gateway_request(
        &method,
        &route,
        started_at.elapsed().as_secs_f64(),
        response.status().is_success(),
    );
    response
}
