//! İyzico: the flagship driver (HMAC-SHA1 signing, hosted 3-D Secure form,
//! no webhook signature scheme — status is recovered by re-fetching).

pub mod transformers;

use async_trait::async_trait;
use common_enums::{Environment, Provider};
use common_utils::request::{Method, RequestBuilder, RequestContent};
use domain_types::connector_flow::{
    CancelPayment, Complete3DPayment, Create3DPayment, CreatePayment, GetPaymentStatus,
    RefundPayment,
};
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
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
    build_payment_request, canonical_decline_code, sign, to_payment_response, IyzicoAuthType,
    IyzicoPaymentResponse,
};

pub struct Iyzico {
    auth: IyzicoAuthType,
}

impl Iyzico {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: IyzicoAuthType::from_config(config)?,
        })
    }

    fn base_url_for<'a>(&self, connectors: &'a Connectors, environment: Environment) -> &'a str {
        connectors.for_provider(Provider::Iyzico).base_url(environment)
    }

    /// Sign, send, and log one İyzico HTTP exchange. `path` is the URI the
    /// signature's `uri` term is taken over.
    async fn call(
        &self,
        services: &DriverServices<'_>,
        path: &str,
        payment_id: &str,
        body: serde_json::Value,
    ) -> ConnectorResult<(IyzicoPaymentResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let signature = sign(&self.auth, path, &body)?;
        let url = format!(
            "{}{path}",
            self.base_url_for(services.connectors, services.environment)
        );

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url)
            .header("Authorization", signature)
            .header("x-iyzi-rnd", common_utils::id::generate_uuid())
            .body(RequestContent::Json(body.clone()))
            .build();

        let raw = services
            .http
            .execute(request)
            .await
            .map_err(Report::new)?;

        let ended_at = time::OffsetDateTime::now_utc();
        let provider_response: serde_json::Value =
            serde_json::from_slice(&raw.body).unwrap_or(serde_json::Value::Null);

        services
            .logger
            .record(ExchangeRecord {
                log_id: services.log_id.to_owned(),
                tenant_id: services.tenant_id,
                provider: Provider::Iyzico,
                payment_id: payment_id.to_owned(),
                endpoint: path.to_owned(),
                client_request: serde_json::Value::Null,
                provider_request: mask_request_body(&body),
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
                "İyzico responded with status {}",
                raw.status_code
            ))
            .into());
        }

        let parsed: IyzicoPaymentResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

/// Masks `paymentCard.cardNumber`/`cvc` before the exchange reaches the
/// request logger ("PAN/CVV masking enforced at the logging
/// boundary").
fn mask_request_body(body: &serde_json::Value) -> serde_json::Value {
    let mut masked = body.clone();
    if let Some(card) = masked.get_mut("paymentCard").and_then(|v| v.as_object_mut()) {
        if let Some(number) = card.get("cardNumber").and_then(|v| v.as_str()) {
            let masked_number = common_utils::pan::mask_card_number(number);
            card.insert("cardNumber".to_owned(), serde_json::Value::String(masked_number));
        }
        if card.contains_key("cvc") {
            card.insert(
                "cvc".to_owned(),
                serde_json::Value::String(common_utils::pan::elide_cvv().to_owned()),
            );
        }
    }
    masked
}

impl interfaces::api::ConnectorCommon for Iyzico {
    fn id(&self) -> Provider {
        Provider::Iyzico
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        self.base_url_for(connectors, Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("apiKey", "sandbox-ABC123"),
            ConfigField::required("secretKey", "sandbox-XYZ789"),
        ]
    }
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Iyzico {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let wire_request = build_payment_request(request, None);
        let body = serde_json::to_value(&wire_request)
            .change_context(ConnectorError::InvalidDataFormat {
                field_name: "paymentRequest",
                reason: "failed to serialise".to_owned(),
            })?;
        let payment_id = request.conversation_id_or_generated();
        let (response, raw) = self.call(services, "/payment/auth", &payment_id, body).await?;
        Ok(to_payment_response(response, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Iyzico {
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
            provider: Provider::Iyzico,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Iyzico, &token);

        let wire_request = build_payment_request(request, Some(return_url));
        let body = serde_json::to_value(&wire_request)
            .change_context(ConnectorError::InvalidDataFormat {
                field_name: "paymentRequest",
                reason: "failed to serialise".to_owned(),
            })?;
        let (response, raw) = self
            .call(services, "/payment/3dsecure/initialize", &payment_id, body)
            .await?;
        let payment_response = to_payment_response(response, request.currency, raw);
        payment_response.check_3d_pending_invariant()?;
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Iyzico {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &Complete3DPaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let conversation_id = request
            .callback_data
            .get("conversationId")
            .cloned()
            .unwrap_or_else(|| request.state.payment_id.clone());
        let payment_id = request
            .callback_data
            .get("paymentId")
            .cloned()
            .ok_or(ConnectorError::WebhookFieldMissing("paymentId"))?;

        let body = serde_json::json!({
            "locale": "en",
            "conversationId": conversation_id,
            "paymentId": payment_id,
        });
        let (response, raw) = self
            .call(services, "/payment/3dsecure/auth", &conversation_id, body)
            .await?;
        Ok(to_payment_response(response, request.state.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Iyzico {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let body = serde_json::json!({
            "locale": "en",
            "conversationId": request.payment_id,
            "paymentConversationId": request.payment_id,
        });
        let (response, raw) = self
            .call(services, "/payment/detail", &request.payment_id, body)
            .await?;
        Ok(to_payment_response(response, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Iyzico {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let body = serde_json::json!({
            "locale": "en",
            "conversationId": request.payment_id,
            "paymentId": request.payment_id,
            "ip": "127.0.0.1",
        });
        let (response, raw) = self
            .call(services, "/payment/cancel", &request.payment_id, body)
            .await?;
        Ok(to_payment_response(response, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Iyzico {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let body = serde_json::json!({
            "locale": "en",
            "conversationId": request.conversation_id.clone().unwrap_or_else(common_utils::id::generate_uuid),
            "paymentTransactionId": request.payment_id,
            "price": request.refund_amount.to_major_unit_string(),
            "ip": "127.0.0.1",
        });
        let (response, _raw) = self
            .call(services, "/payment/refund", &request.payment_id, body)
            .await?;

        let success = response.status == "success";
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

impl IncomingWebhook for Iyzico {
    fn validate_webhook(
        &self,
        _request: &domain_types::router_data::RequestDetails,
    ) -> ConnectorResult<Option<WebhookDetails>> {
        Ok(None)
    }

    fn requires_status_refetch(&self) -> bool {
        true
    }
}

impl ConnectorServiceTrait for Iyzico {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_names_both_keys() {
        let iyzico = Iyzico {
            auth: IyzicoAuthType {
                api_key: masking::Secret::new("k".to_owned()),
                secret_key: masking::Secret::new("s".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&iyzico, Environment::Sandbox);
        assert_eq!(fields.len(), 2);
        assert!(fields.iter().any(|f| f.key == "apiKey"));
        assert!(fields.iter().any(|f| f.key == "secretKey"));
    }

    #[test]
    fn mask_request_body_hides_pan_and_cvc() {
        let body = serde_json::json!({
            "paymentCard": {"cardNumber": "4111111111111111", "cvc": "123"}
        });
        let masked = mask_request_body(&body);
        assert_eq!(masked["paymentCard"]["cvc"], "***");
        assert_ne!(masked["paymentCard"]["cardNumber"], "4111111111111111");
    }
}
