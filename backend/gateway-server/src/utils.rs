//! Request-tracing helpers, narrowed to the two headers this gateway's
//! ingress actually carries: `X-Tenant-Id` and `X-Request-Id`.

use common_utils::consts;
use http::Request;

/// Opens a tracing span for one ingress request and records the tenant and
/// request identifiers off its headers, so every log line emitted while
/// handling the request (including deep inside a driver) carries them
/// without threading them through every function signature.
pub fn record_fields_from_header<B>(request: &Request<B>) -> tracing::Span {
    let url_path = request.uri().path();

    let span = tracing::info_span!(
        "request",
        uri = %url_path,
        method = %request.method(),
        tenant_id = tracing::field::Empty,
        request_id = tracing::field::Empty,
    );

    if let Some(tenant_id) = request
        .headers()
        .get(consts::X_TENANT_ID)
        .and_then(|value| value.to_str().ok())
    {
        span.record("tenant_id", tenant_id);
    }

    if let Some(request_id) = request
        .headers()
        .get(consts::X_REQUEST_ID)
        .and_then(|value| value.to_str().ok())
    {
        span.record("request_id", request_id);
    }

    span
}
