//! End-to-end ingress tests driving the full `axum::Router` with a scripted
//! `HttpExecutor` standing in for the provider network, exercising
//! `ConnectorServiceTrait::execute` rather than unit-level transformer
//! calls.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use common_enums::{Currency, Environment, Provider};
use common_utils::request::{Request as DriverRequest, RequestContent};
use dashmap::DashMap;
use domain_types::errors::ConnectorError;
use domain_types::payment_address::{Address, Customer};
use domain_types::payment_method_data::CardInfo;
use domain_types::types::{Connectors, PaymentRequest, ProviderEndpoints};
use gateway_server::{dispatcher, routes, state};
use http_body_util::BodyExt;
use interfaces::HttpExecutor;
use masking::Secret;
use tower::ServiceExt;

/// Stands in for the real `ReqwestExecutor`. Responses are queued per
/// URL-path substring and handed out FIFO; every outgoing `Request` is kept
/// so a test can inspect what a driver actually sent (e.g. the 3-D return
/// URL embedded in İyzico's `callbackUrl` field).
struct ScriptedExecutor {
    queues: DashMap<String, Mutex<VecDeque<common_utils::request::RawResponse>>>,
    sent: Mutex<Vec<DriverRequest>>,
}

impl ScriptedExecutor {
    fn new() -> Self {
        Self {
            queues: DashMap::new(),
            sent: Mutex::new(Vec::new()),
        }
    }

    fn push(&self, path_suffix: &str, response: common_utils::request::RawResponse) {
        self.queues
            .entry(path_suffix.to_owned())
            .or_insert_with(|| Mutex::new(VecDeque::new()))
            .lock()
            .unwrap()
            .push_back(response);
    }

    fn sent_requests(&self) -> Vec<DriverRequest> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl HttpExecutor for ScriptedExecutor {
    async fn execute(&self, request: DriverRequest) -> Result<common_utils::request::RawResponse, ConnectorError> {
        self.sent.lock().unwrap().push(request.clone());
        for entry in self.queues.iter() {
            if request.url.contains(entry.key().as_str()) {
                if let Some(response) = entry.value().lock().unwrap().pop_front() {
                    return Ok(response);
                }
            }
        }
        Err(ConnectorError::RequestNotSent(format!(
            "no scripted response queued for {}",
            request.url
        )))
    }
}

fn json_response(status_code: u16, body: serde_json::Value) -> common_utils::request::RawResponse {
    common_utils::request::RawResponse {
        status_code,
        body: serde_json::to_vec(&body).unwrap(),
        headers: Vec::new(),
    }
}

fn connectors_fixture() -> Connectors {
    let endpoints = || ProviderEndpoints {
        sandbox_base_url: "https://sandbox.example".to_owned(),
        production_base_url: "https://production.example".to_owned(),
    };
    Connectors {
        iyzico: endpoints(),
        stripe: endpoints(),
        ozanpay: endpoints(),
        paycell: endpoints(),
        papara: endpoints(),
        nkolay: endpoints(),
        paytr: endpoints(),
        payu: endpoints(),
    }
}

/// Builds a ready-to-serve router backed by `executor`, with `tenant_id`'s
/// credentials for `provider` already seeded into the resolver.
fn build_router(tenant_id: i64, provider: Provider, credentials: &[(&str, &str)], executor: Arc<ScriptedExecutor>) -> axum::Router {
    let app_state = state::AppState::assemble(connectors_fixture(), "https://gateway.example".to_owned(), executor);

    let validator = app_state.registry.config_validator(provider).expect("driver initializes from probe config");
    for (key, value) in credentials {
        app_state
            .resolver
            .put(tenant_id, provider, Environment::Sandbox, validator.as_ref(), key, Secret::new((*value).to_owned()))
            .expect("seeding tenant credentials");
    }

    let dispatcher = Arc::new(dispatcher::Dispatcher::new(Arc::new(app_state)));
    routes::router(dispatcher)
}

fn sample_payment_request(use_3d: bool) -> PaymentRequest {
    PaymentRequest {
        tenant_id: 0,
        amount: common_utils::types::MajorUnit::new(rust_decimal::Decimal::new(10000, 2)),
        currency: Currency::TRY,
        use_3d,
        callback_url: Some("https://merchant.example/return".to_owned()),
        client_ip: Some("127.0.0.1".to_owned()),
        client_user_agent: None,
        conversation_id: Some("conv-1".to_owned()),
        reference_id: Some("order-1".to_owned()),
        description: None,
        customer: Customer {
            id: Some("cust-1".to_owned()),
            name: Some("Jane".to_owned()),
            surname: Some("Doe".to_owned()),
            email: "jane@example.com".to_owned(),
            phone: None,
            address: Address {
                line: Some("1 Main St".to_owned()),
                city: Some("Istanbul".to_owned()),
                country: Some("Turkey".to_owned()),
                zip: None,
            },
            ip_address: None,
        },
        card_info: CardInfo {
            holder_name: Secret::new("Jane Doe".to_owned()),
            card_number: Secret::new("4111111111111111".to_owned()),
            expire_month: Secret::new("12".to_owned()),
            expire_year: Secret::new("2030".to_owned()),
            cvv: Secret::new("123".to_owned()),
        },
        items: vec![],
        installment_count: 1,
        environment: Environment::Sandbox,
        log_id: String::new(),
    }
}

async fn post_json(router: &axum::Router, uri: &str, tenant_id: i64, body: &serde_json::Value) -> (axum::http::StatusCode, serde_json::Value) {
    let request = axum::http::Request::builder()
        .method("POST")
        .uri(uri)
        .header("authorization", format!("Bearer {tenant_id}"))
        .header("content-type", "application/json")
        .body(axum::body::Body::from(serde_json::to_vec(body).unwrap()))
        .unwrap();
    let response = router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
    (status, value)
}

fn extract_token(sent: &[DriverRequest]) -> String {
    let body = sent
        .iter()
        .find_map(|request| match &request.body {
            Some(RequestContent::Json(value)) if value.get("callbackUrl").is_some() => {
                value.get("callbackUrl").and_then(|v| v.as_str()).map(str::to_owned)
            }
            _ => None,
        })
        .expect("a request carrying callbackUrl was sent");
    let url = url::Url::parse(&body).unwrap();
    url.query_pairs().find(|(k, _)| k == "token").map(|(_, v)| v.into_owned()).expect("token query param")
}

#[tokio::test]
async fn happy_path_non_3d_payment_succeeds() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push(
        "/payment/auth",
        json_response(
            200,
            serde_json::json!({
                "status": "success",
                "paymentId": "pay-1",
                "conversationId": "conv-1",
                "price": "100.00",
                "paidPrice": "100.00",
                "currency": "TRY",
            }),
        ),
    );
    let router = build_router(7, Provider::Iyzico, &[("apiKey", "k"), ("secretKey", "s")], executor);

    let request = sample_payment_request(false);
    let body = serde_json::to_value(&request).unwrap();
    let (status, value) = post_json(&router, "/v1/payments/iyzico", 7, &body).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(value["success"], true);
    assert_eq!(value["status"], "successful");
    assert_eq!(value["paymentId"], "pay-1");
}

#[tokio::test]
async fn insufficient_funds_decline_returns_200_with_failure_details() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push(
        "/payment/auth",
        json_response(
            200,
            serde_json::json!({
                "status": "failure",
                "errorCode": "5006",
                "errorMessage": "Insufficient funds",
            }),
        ),
    );
    let router = build_router(7, Provider::Iyzico, &[("apiKey", "k"), ("secretKey", "s")], executor);

    let request = sample_payment_request(false);
    let body = serde_json::to_value(&request).unwrap();
    let (status, value) = post_json(&router, "/v1/payments/iyzico", 7, &body).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(value["success"], false);
    assert_eq!(value["errorCode"], "INSUFFICIENT_FUNDS");
}

#[tokio::test]
async fn three_d_secure_redirect_carries_html_and_token_return_url() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push(
        "/payment/3dsecure/initialize",
        json_response(
            200,
            serde_json::json!({
                "status": "pending",
                "conversationId": "conv-1",
                "threeDsHtmlContent": "<form action=\"https://acs.example\"></form>",
            }),
        ),
    );
    let router = build_router(7, Provider::Iyzico, &[("apiKey", "k"), ("secretKey", "s")], executor.clone());

    let request = sample_payment_request(true);
    let body = serde_json::to_value(&request).unwrap();
    let (status, value) = post_json(&router, "/v1/payments/iyzico", 7, &body).await;

    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(value["status"], "pending");
    assert!(value["html"].as_str().unwrap().contains("<form"));

    let token = extract_token(&executor.sent_requests());
    assert!(token.len() >= 22);
}

#[tokio::test]
async fn correlator_token_is_single_use() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push(
        "/payment/3dsecure/initialize",
        json_response(
            200,
            serde_json::json!({
                "status": "pending",
                "conversationId": "conv-1",
                "threeDsHtmlContent": "<form action=\"https://acs.example\"></form>",
            }),
        ),
    );
    executor.push(
        "/payment/3dsecure/auth",
        json_response(
            200,
            serde_json::json!({
                "status": "success",
                "paymentId": "pay-1",
                "conversationId": "conv-1",
                "paidPrice": "100.00",
            }),
        ),
    );
    let router = build_router(7, Provider::Iyzico, &[("apiKey", "k"), ("secretKey", "s")], executor.clone());

    let request = sample_payment_request(true);
    let body = serde_json::to_value(&request).unwrap();
    let (status, _) = post_json(&router, "/v1/payments/iyzico", 7, &body).await;
    assert_eq!(status, axum::http::StatusCode::OK);

    let token = extract_token(&executor.sent_requests());
    let callback_body = "paymentId=pay-1&conversationId=conv-1";

    let first = axum::http::Request::builder()
        .method("POST")
        .uri(format!("/v1/callback/iyzico?token={token}"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(callback_body))
        .unwrap();
    let first_response = router.clone().oneshot(first).await.unwrap();
    assert_eq!(first_response.status(), axum::http::StatusCode::SEE_OTHER);
    let redirect_location = first_response.headers().get("location").unwrap().to_str().unwrap().to_owned();
    assert!(redirect_location.starts_with("https://merchant.example/return"));
    assert!(redirect_location.contains("paymentId=pay-1"));

    let second = axum::http::Request::builder()
        .method("POST")
        .uri(format!("/v1/callback/iyzico?token={token}"))
        .header("content-type", "application/x-www-form-urlencoded")
        .body(axum::body::Body::from(callback_body))
        .unwrap();
    let second_response = router.clone().oneshot(second).await.unwrap();
    assert_eq!(second_response.status(), axum::http::StatusCode::GONE);
}

#[tokio::test]
async fn partial_then_full_refund_accumulates_and_flips_status_to_refunded() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push(
        "/payment/auth",
        json_response(
            200,
            serde_json::json!({
                "status": "success",
                "paymentId": "pay-1",
                "conversationId": "conv-1",
                "paidPrice": "100.00",
            }),
        ),
    );
    executor.push(
        "/payment/refund",
        json_response(200, serde_json::json!({"status": "success", "paymentId": "refund-1"})),
    );
    executor.push(
        "/payment/refund",
        json_response(200, serde_json::json!({"status": "success", "paymentId": "refund-2"})),
    );
    executor.push(
        "/payment/detail",
        json_response(
            200,
            serde_json::json!({"status": "success", "paymentId": "pay-1", "paidPrice": "100.00"}),
        ),
    );
    let router = build_router(7, Provider::Iyzico, &[("apiKey", "k"), ("secretKey", "s")], executor);

    let payment = sample_payment_request(false);
    let payment_body = serde_json::to_value(&payment).unwrap();
    let (status, _created) = post_json(&router, "/v1/payments/iyzico", 7, &payment_body).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    // The dispatcher settles the refund ledger against `conversationId`
    // (what every flow's wire body calls `paymentId`/`conversationId`
    // interchangeably), not İyzico's own internal `paymentId` — see
    // DESIGN.md.
    let payment_id = payment.conversation_id.clone().unwrap();

    let first_refund = serde_json::json!({
        "tenantId": 7,
        "paymentId": payment_id,
        "refundAmount": "40.00",
        "currency": "TRY",
    });
    let (status, refund_one) = post_json(&router, "/v1/payments/iyzico/refund", 7, &first_refund).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(refund_one["success"], true);

    let second_refund = serde_json::json!({
        "tenantId": 7,
        "paymentId": payment_id,
        "refundAmount": "60.00",
        "currency": "TRY",
    });
    let (status, refund_two) = post_json(&router, "/v1/payments/iyzico/refund", 7, &second_refund).await;
    assert_eq!(status, axum::http::StatusCode::OK);
    assert_eq!(refund_two["success"], true);

    let status_request = axum::http::Request::builder()
        .method("GET")
        .uri(format!("/v1/payments/iyzico/{payment_id}"))
        .header("authorization", "Bearer 7")
        .body(axum::body::Body::empty())
        .unwrap();
    let status_response = router.clone().oneshot(status_request).await.unwrap();
    assert_eq!(status_response.status(), axum::http::StatusCode::OK);
    let bytes = status_response.into_body().collect().await.unwrap().to_bytes();
    let value: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(value["status"], "refunded");

    let over_refund = serde_json::json!({
        "tenantId": 7,
        "paymentId": payment_id,
        "refundAmount": "1.00",
        "currency": "TRY",
    });
    let (status, over_refund_body) = post_json(&router, "/v1/payments/iyzico/refund", 7, &over_refund).await;
    assert_eq!(status, axum::http::StatusCode::BAD_REQUEST);
    assert_eq!(over_refund_body["errorCode"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn nkolay_cancel_echoes_system_time_from_the_original_payment_request() {
    let executor = Arc::new(ScriptedExecutor::new());
    executor.push(
        "/payment",
        json_response(
            200,
            serde_json::json!({"resultCode": "00", "referenceCode": "order-1"}),
        ),
    );
    executor.push(
        "/cancel",
        json_response(
            200,
            serde_json::json!({"resultCode": "00", "referenceCode": "order-1", "status": "CANCELLED"}),
        ),
    );
    let router = build_router(
        7,
        Provider::Nkolay,
        &[("merchantId", "m"), ("secret", "s"), ("sx", "sx")],
        executor.clone(),
    );

    let payment = sample_payment_request(false);
    let payment_body = serde_json::to_value(&payment).unwrap();
    let (status, _) = post_json(&router, "/v1/payments/nkolay", 7, &payment_body).await;
    assert_eq!(status, axum::http::StatusCode::OK);

    let cancel_request = axum::http::Request::builder()
        .method("DELETE")
        .uri("/v1/payments/nkolay/order-1")
        .header("authorization", "Bearer 7")
        .body(axum::body::Body::empty())
        .unwrap();
    let cancel_response = router.clone().oneshot(cancel_request).await.unwrap();
    assert_eq!(cancel_response.status(), axum::http::StatusCode::OK);

    let sent = executor.sent_requests();
    let payment_call = sent
        .iter()
        .find(|request| request.url.contains("/payment") && !request.url.contains("/payments"))
        .expect("a payment request was sent");
    let Some(RequestContent::FormData(payment_fields)) = &payment_call.body else {
        panic!("expected form-encoded payment body");
    };
    let original_system_time = payment_fields
        .iter()
        .find(|(k, _)| k == "systemTime")
        .map(|(_, v)| v.clone())
        .expect("systemTime was recorded on the original payment request");

    let cancel_call = sent
        .iter()
        .find(|request| request.url.contains("/cancel"))
        .expect("a cancel request was sent");
    let Some(RequestContent::FormData(cancel_fields)) = &cancel_call.body else {
        panic!("expected form-encoded cancel body");
    };
    let trx_date = cancel_fields.iter().find(|(k, _)| k == "trxDate").map(|(_, v)| v.clone());
    assert_eq!(
        trx_date,
        Some(connector_integration::connectors::nkolay::transformers::trx_date_from_system_time(
            &original_system_time
        ))
    );
}

#[tokio::test]
async fn unseeded_tenant_gets_a_config_error_not_a_panic() {
    let executor = Arc::new(ScriptedExecutor::new());
    let router = build_router(7, Provider::Iyzico, &[], executor);

    let request = sample_payment_request(false);
    let body = serde_json::to_value(&request).unwrap();
    let (status, value) = post_json(&router, "/v1/payments/iyzico", 99, &body).await;

    assert_eq!(status, axum::http::StatusCode::PRECONDITION_FAILED);
    assert_eq!(value["errorCode"], "CONFIG_ERROR");
}
