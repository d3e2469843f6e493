//! Ingress HTTP surface. Every handler extracts the
//! provider/tenant context, hands the rest to the dispatcher (C4), and
//! maps the result onto the wire shapes and status codes the error
//! taxonomy names.

use std::collections::HashMap;
use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use common_enums::{Environment, Provider};
use domain_types::errors::GatewayError;
use domain_types::router_data::{HttpMethod, RequestDetails};
use domain_types::types::{CancelRequest, GetPaymentStatusRequest, PaymentRequest, RefundRequest};
use error_stack::Report;
use serde::{Deserialize, Serialize};

use crate::dispatcher::{self, Dispatcher};

pub fn router(dispatcher: Arc<Dispatcher>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/v1/payments/{provider}", post(create_payment))
        .route("/v1/payments/{provider}/refund", post(refund_payment))
        .route("/v1/payments/{provider}/{payment_id}", get(get_payment_status).delete(cancel_payment))
        .route("/v1/callback/{provider}", get(callback).post(callback))
        .route("/v1/webhooks/{provider}", post(webhook))
        .with_state(dispatcher)
}

async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    #[serde(rename = "errorCode")]
    error_code: String,
    message: String,
}

/// Maps a `GatewayError` to its HTTP status and stable error code,
/// with the error_stack chain emitted to the trace rather than the client.
fn error_response(report: Report<GatewayError>) -> Response {
    let error = report.current_context();
    let status = StatusCode::from_u16(error.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    tracing::warn!(?report, error_code = error.error_code(), "request failed");
    let body = ErrorBody {
        error_code: error.error_code().to_owned(),
        message: error.to_string(),
    };
    (status, Json(body)).into_response()
}

/// Ingress requires bearer auth carrying the tenant id. A full JWT/session
/// layer is out of scope here (see DESIGN.md): the bearer token's value is
/// taken directly as the tenant id, which is the identity an upstream API
/// gateway would otherwise have already verified.
fn tenant_id_from_auth(headers: &HeaderMap) -> Result<i64, Report<GatewayError>> {
    let value = headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            Report::new(GatewayError::Validation {
                message: "missing Authorization header".to_owned(),
            })
        })?;

    let token = value.strip_prefix("Bearer ").ok_or_else(|| {
        Report::new(GatewayError::Validation {
            message: "Authorization header must be a bearer token".to_owned(),
        })
    })?;

    token.trim().parse::<i64>().map_err(|_| {
        Report::new(GatewayError::Validation {
            message: "bearer token did not carry a numeric tenantId".to_owned(),
        })
    })
}

#[derive(Debug, Deserialize)]
struct EnvironmentQuery {
    environment: Option<Environment>,
}

async fn create_payment(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(provider): Path<Provider>,
    headers: HeaderMap,
    Json(request): Json<PaymentRequest>,
) -> Response {
    let tenant_id = match tenant_id_from_auth(&headers) {
        Ok(id) => id,
        Err(report) => return error_response(report),
    };

    match dispatcher.create_payment(tenant_id, provider, request).await {
        Ok(response) => Json(response).into_response(),
        Err(report) => error_response(report),
    }
}

async fn get_payment_status(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((provider, payment_id)): Path<(Provider, String)>,
    Query(query): Query<EnvironmentQuery>,
    headers: HeaderMap,
) -> Response {
    let tenant_id = match tenant_id_from_auth(&headers) {
        Ok(id) => id,
        Err(report) => return error_response(report),
    };
    let environment = query.environment.unwrap_or_default();

    let request = GetPaymentStatusRequest {
        tenant_id,
        payment_id,
    };
    match dispatcher.get_payment_status(tenant_id, provider, environment, request).await {
        Ok(response) => Json(response).into_response(),
        Err(report) => error_response(report),
    }
}

#[derive(Debug, Default, Deserialize)]
struct CancelBody {
    reason: Option<String>,
}

async fn cancel_payment(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path((provider, payment_id)): Path<(Provider, String)>,
    Query(query): Query<EnvironmentQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let tenant_id = match tenant_id_from_auth(&headers) {
        Ok(id) => id,
        Err(report) => return error_response(report),
    };
    let environment = query.environment.unwrap_or_default();
    let cancel_body: CancelBody = if body.is_empty() {
        CancelBody::default()
    } else {
        match serde_json::from_slice(&body) {
            Ok(parsed) => parsed,
            Err(_) => CancelBody::default(),
        }
    };

    let request = CancelRequest {
        tenant_id,
        payment_id,
        reason: cancel_body.reason,
    };
    match dispatcher.cancel_payment(tenant_id, provider, environment, request).await {
        Ok(response) => Json(response).into_response(),
        Err(report) => error_response(report),
    }
}

async fn refund_payment(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(provider): Path<Provider>,
    Query(query): Query<EnvironmentQuery>,
    headers: HeaderMap,
    Json(mut request): Json<RefundRequest>,
) -> Response {
    let tenant_id = match tenant_id_from_auth(&headers) {
        Ok(id) => id,
        Err(report) => return error_response(report),
    };
    request.tenant_id = tenant_id;
    let environment = query.environment.unwrap_or_default();

    match dispatcher.refund_payment(tenant_id, provider, environment, request).await {
        Ok(response) => Json(response).into_response(),
        Err(report) => error_response(report),
    }
}

#[derive(Debug, Deserialize)]
struct CallbackQuery {
    token: Option<String>,
    #[serde(rename = "tenantId")]
    tenant_id: Option<i64>,
    #[serde(rename = "originalCallbackUrl")]
    original_callback_url: Option<String>,
}

/// Resolve a 3-D Secure return visit (by correlator token, or
/// the legacy `tenantId`/`originalCallbackUrl` pair), finish the payment,
/// and redirect to the client's original callback URL with the outcome
/// appended as query parameters. Falls back to a terminal error body only
/// when no redirect target could be established at all.
async fn callback(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(provider): Path<Provider>,
    Query(query): Query<CallbackQuery>,
    body: Bytes,
) -> Response {
    let callback_data = parse_callback_body(&body);

    let legacy_payment_id = if query.token.is_none() {
        dispatcher::extract_payment_id_hint(&body)
    } else {
        None
    };

    let outcome = dispatcher
        .complete_callback(
            provider,
            query.token.as_deref(),
            query.tenant_id,
            legacy_payment_id.as_deref(),
            query.original_callback_url.as_deref(),
            callback_data,
        )
        .await;

    match outcome {
        Ok(outcome) => match outcome.response {
            Ok(response) => {
                if outcome.state.original_callback.is_empty() {
                    return (StatusCode::OK, Json(response)).into_response();
                }
                let redirect_to = append_query(
                    &outcome.state.original_callback,
                    &[
                        ("paymentId", response.payment_id.clone()),
                        ("status", response.status.to_string()),
                        ("transactionId", response.transaction_id.clone()),
                        ("amount", response.amount.as_decimal().to_string()),
                    ],
                );
                Redirect::to(&redirect_to).into_response()
            }
            Err(report) => {
                let error = report.current_context();
                if outcome.state.original_callback.is_empty() {
                    return error_response(report);
                }
                let redirect_to = append_query(
                    &outcome.state.original_callback,
                    &[
                        ("status", "failed".to_owned()),
                        ("errorCode", error.error_code().to_owned()),
                    ],
                );
                Redirect::to(&redirect_to).into_response()
            }
        },
        Err(report) => error_response(report),
    }
}

fn parse_callback_body(body: &[u8]) -> HashMap<String, String> {
    if let Ok(serde_json::Value::Object(map)) = serde_json::from_slice::<serde_json::Value>(body) {
        return map
            .into_iter()
            .filter_map(|(k, v)| v.as_str().map(|s| (k, s.to_owned())))
            .collect();
    }
    url::form_urlencoded::parse(body).into_owned().collect()
}

fn append_query(base: &str, pairs: &[(&str, String)]) -> String {
    match url::Url::parse(base) {
        Ok(mut url) => {
            {
                let mut query_pairs = url.query_pairs_mut();
                for (key, value) in pairs {
                    query_pairs.append_pair(key, value);
                }
            }
            url.into()
        }
        Err(_) => base.to_owned(),
    }
}

#[derive(Debug, Deserialize)]
struct WebhookQuery {
    #[serde(rename = "tenantId")]
    tenant_id: i64,
    environment: Option<Environment>,
}

async fn webhook(
    State(dispatcher): State<Arc<Dispatcher>>,
    Path(provider): Path<Provider>,
    Query(query): Query<WebhookQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request = RequestDetails {
        method: HttpMethod::Post,
        uri: format!("/v1/webhooks/{provider}"),
        headers: headers
            .iter()
            .filter_map(|(k, v)| v.to_str().ok().map(|v| (k.to_string(), v.to_owned())))
            .collect(),
        body: body.to_vec(),
    };

    let environment = query.environment.unwrap_or_default();
    match dispatcher.validate_webhook(query.tenant_id, provider, environment, &request).await {
        Ok(outcome) => Json(serde_json::json!({ "valid": outcome.valid })).into_response(),
        Err(report) => error_response(report),
    }
}
