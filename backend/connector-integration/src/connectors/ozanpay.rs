//! OzanPay: bearer-token JSON payments API, SHA-256 hex webhook signature.

pub mod transformers;

use async_trait::async_trait;
use common_enums::{Environment, Provider};
use common_utils::request::{Method, RequestBuilder, RequestContent};
use domain_types::connector_flow::{
    CancelPayment, Complete3DPayment, Create3DPayment, CreatePayment, GetPaymentStatus,
    RefundPayment,
};
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::{ConfigMap, RequestDetails};
use domain_types::tenant_config::ConfigField;
use domain_types::types::{
    CancelRequest, Connectors, GetPaymentStatusRequest, PaymentRequest, PaymentResponse,
    RefundRequest, RefundResponse,
};
use error_stack::{Report, ResultExt};
use interfaces::connector_integration::DriverServices;
use interfaces::connector_service::Complete3DPaymentRequest;
use interfaces::ports::ExchangeRecord;
use interfaces::{ConnectorIntegration, ConnectorServiceTrait, IncomingWebhook, WebhookDetails};

use transformers::{
    build_payment_request, canonical_decline_code, field_as_string, to_payment_response,
    webhook_signature, OzanpayAuthType, OzanpayPaymentResponse,
};

pub struct Ozanpay {
    auth: OzanpayAuthType,
}

impl Ozanpay {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: OzanpayAuthType::from_config(config)?,
        })
    }

    async fn call(
        &self,
        services: &DriverServices<'_>,
        method: Method,
        path: &str,
        payment_id: &str,
        body: Option<serde_json::Value>,
    ) -> ConnectorResult<(OzanpayPaymentResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let url = format!(
            "{}{path}",
            services
                .connectors
                .for_provider(Provider::Ozanpay)
                .base_url(services.environment)
        );

        let mut builder = RequestBuilder::new()
            .method(method)
            .url(url)
            .header("Authorization", self.auth.bearer_header());
        if let Some(json) = body.clone() {
            builder = builder.body(RequestContent::Json(json));
        }
        let request = builder.build();

        let raw = services.http.execute(request).await.map_err(Report::new)?;
        let ended_at = time::OffsetDateTime::now_utc();
        let provider_response: serde_json::Value =
            serde_json::from_slice(&raw.body).unwrap_or(serde_json::Value::Null);

        services
            .logger
            .record(ExchangeRecord {
                log_id: services.log_id.to_owned(),
                tenant_id: services.tenant_id,
                provider: Provider::Ozanpay,
                payment_id: payment_id.to_owned(),
                endpoint: path.to_owned(),
                client_request: serde_json::Value::Null,
                provider_request: mask_request(body.unwrap_or(serde_json::Value::Null)),
                provider_response: provider_response.clone(),
                status_code: Some(raw.status_code),
                error_code: None,
                error_message: None,
                started_at,
                ended_at,
            })
            .await;

        if !raw.is_success() {
            return Err(ConnectorError::RequestNotSent(format!(
                "OzanPay responded with status {}",
                raw.status_code
            ))
            .into());
        }

        let parsed: OzanpayPaymentResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

fn mask_request(mut body: serde_json::Value) -> serde_json::Value {
    if let Some(card) = body.get_mut("card").and_then(|v| v.as_object_mut()) {
        if let Some(number) = card.get("number").and_then(|v| v.as_str()) {
            let masked = common_utils::pan::mask_card_number(number);
            card.insert("number".to_owned(), serde_json::Value::String(masked));
        }
        if card.contains_key("cvv") {
            card.insert(
                "cvv".to_owned(),
                serde_json::Value::String(common_utils::pan::elide_cvv().to_owned()),
            );
        }
    }
    body
}

impl interfaces::api::ConnectorCommon for Ozanpay {
    fn id(&self) -> Provider {
        Provider::Ozanpay
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.for_provider(Provider::Ozanpay).base_url(Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("apiKey", "ozk_live_..."),
            ConfigField::required("merchantId", "123456"),
            ConfigField::required("secretKey", "secret"),
        ]
    }
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Ozanpay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let wire_request = build_payment_request(request, &self.auth, None);
        let body = serde_json::to_value(&wire_request)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let payment_id = request.conversation_id_or_generated();
        let (response, raw) = self
            .call(services, Method::Post, "/api/v1/payments", &payment_id, Some(body))
            .await?;
        Ok(to_payment_response(response, request.amount, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Ozanpay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let payment_id = request.conversation_id_or_generated();
        let state = domain_types::callback_state::CallbackState {
            payment_id: payment_id.clone(),
            tenant_id: services.tenant_id,
            amount: request.amount,
            currency: request.currency,
            log_id: services.log_id.to_owned(),
            provider: Provider::Ozanpay,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Ozanpay, &token);

        let wire_request = build_payment_request(request, &self.auth, Some(return_url));
        let body = serde_json::to_value(&wire_request)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let (response, raw) = self
            .call(services, Method::Post, "/api/v1/payments", &payment_id, Some(body))
            .await?;
        let payment_response = to_payment_response(response, request.amount, request.currency, raw);
        payment_response.check_3d_pending_invariant()?;
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Ozanpay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &Complete3DPaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let order_id = request
            .callback_data
            .get("orderId")
            .cloned()
            .unwrap_or_else(|| request.state.payment_id.clone());
        let path = format!("/api/v1/payments/{order_id}");
        let (response, raw) = self.call(services, Method::Get, &path, &order_id, None).await?;
        Ok(to_payment_response(response, request.state.amount, request.state.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Ozanpay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let path = format!("/api/v1/payments/{}", request.payment_id);
        let (response, raw) = self
            .call(services, Method::Get, &path, &request.payment_id, None)
            .await?;
        let amount = common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO);
        Ok(to_payment_response(response, amount, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Ozanpay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let path = format!("/api/v1/payments/{}/void", request.payment_id);
        let (response, raw) = self
            .call(services, Method::Post, &path, &request.payment_id, None)
            .await?;
        let amount = common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO);
        Ok(to_payment_response(response, amount, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Ozanpay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let path = format!("/api/v1/payments/{}/refund", request.payment_id);
        let body = serde_json::json!({ "amount": crate::utils::to_minor_units(request.refund_amount) });
        let (response, _raw) = self
            .call(services, Method::Post, &path, &request.payment_id, Some(body))
            .await?;

        let success = response.status == "REFUNDED" || response.status == "APPROVED";
        Ok(RefundResponse {
            success,
            status: if success {
                common_enums::RefundStatus::Succeeded
            } else {
                common_enums::RefundStatus::Failed
            },
            refund_id: response.payment_id.clone().unwrap_or_default(),
            payment_id: request.payment_id.clone(),
            refunded_amount: request.refund_amount,
            currency: request.currency,
            message: response.error_message.clone(),
            error_code: response
                .error_code
                .as_deref()
                .map(canonical_decline_code)
                .map(str::to_owned),
        })
    }
}

impl IncomingWebhook for Ozanpay {
    fn validate_webhook(&self, request: &RequestDetails) -> ConnectorResult<Option<WebhookDetails>> {
        let signature = request
            .header("X-Ozan-Signature")
            .ok_or(ConnectorError::WebhookSignatureMismatch)?;
        let body: serde_json::Value = serde_json::from_slice(&request.body)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;

        let reference_no = field_as_string(&body, "referenceNo");
        let amount = field_as_string(&body, "amount");
        let currency = field_as_string(&body, "currency");
        let status = field_as_string(&body, "status");
        let message = field_as_string(&body, "message");
        let code = field_as_string(&body, "code");

        let expected = webhook_signature(
            &self.auth.secret_key,
            &reference_no,
            &amount,
            &currency,
            &status,
            &message,
            &code,
        );
        if !expected.eq_ignore_ascii_case(signature) {
            return Err(ConnectorError::WebhookSignatureMismatch.into());
        }

        Ok(Some(WebhookDetails {
            payment_id: body.get("paymentId").and_then(|v| v.as_str()).map(str::to_owned),
            reference_no: Some(reference_no).filter(|s| !s.is_empty()),
            transaction_id: body.get("paymentId").and_then(|v| v.as_str()).map(str::to_owned),
            status: Some(status).filter(|s| !s.is_empty()),
            raw: body,
        }))
    }
}

impl ConnectorServiceTrait for Ozanpay {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_has_three_fields() {
        let ozanpay = Ozanpay {
            auth: OzanpayAuthType {
                api_key: masking::Secret::new("a".to_owned()),
                merchant_id: masking::Secret::new("m".to_owned()),
                secret_key: masking::Secret::new("s".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&ozanpay, Environment::Sandbox);
        assert_eq!(fields.len(), 3);
    }
}
