//! Paycell: JSON payments API signed with HMAC-SHA256 base64.

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
use masking::ExposeInterface;

use transformers::{
    auth_header, build_payment_request, canonical_decline_code, sign, to_payment_response,
    PaycellAuthType, PaycellResponse,
};

pub struct Paycell {
    auth: PaycellAuthType,
}

impl Paycell {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: PaycellAuthType::from_config(config)?,
        })
    }

    async fn call(
        &self,
        services: &DriverServices<'_>,
        path: &str,
        payment_id: &str,
        body: serde_json::Value,
        signature: String,
    ) -> ConnectorResult<(PaycellResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let url = format!(
            "{}{path}",
            services
                .connectors
                .for_provider(Provider::Paycell)
                .base_url(services.environment)
        );

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url)
            .header("Authorization", auth_header(&self.auth, &signature))
            .body(RequestContent::Json(body.clone()))
            .build();

        let raw = services.http.execute(request).await.map_err(Report::new)?;
        let ended_at = time::OffsetDateTime::now_utc();
        let provider_response: serde_json::Value =
            serde_json::from_slice(&raw.body).unwrap_or(serde_json::Value::Null);

        services
            .logger
            .record(ExchangeRecord {
                log_id: services.log_id.to_owned(),
                tenant_id: services.tenant_id,
                provider: Provider::Paycell,
                payment_id: payment_id.to_owned(),
                endpoint: path.to_owned(),
                client_request: serde_json::Value::Null,
                provider_request: mask_request(&body),
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
                "Paycell responded with status {}",
                raw.status_code
            ))
            .into());
        }

        let parsed: PaycellResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

fn mask_request(body: &serde_json::Value) -> serde_json::Value {
    let mut masked = body.clone();
    if let Some(card) = masked.get_mut("card").and_then(|v| v.as_object_mut()) {
        if let Some(number) = card.get("cardNumber").and_then(|v| v.as_str()) {
            let number = common_utils::pan::mask_card_number(number);
            card.insert("cardNumber".to_owned(), serde_json::Value::String(number));
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

impl interfaces::api::ConnectorCommon for Paycell {
    fn id(&self) -> Provider {
        Provider::Paycell
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.for_provider(Provider::Paycell).base_url(Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("merchantId", "300000000000001"),
            ConfigField::required("terminalId", "1"),
            ConfigField::required("secretKey", "paycell-secret"),
        ]
    }
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Paycell {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let reference_code = request.reference_id.clone().unwrap_or_else(common_utils::id::generate_uuid);
        let amount = request.amount.to_major_unit_string();
        let currency = request.currency.to_string();
        let signature = sign(&self.auth, &reference_code, &amount, &currency)?;

        let wire_request = build_payment_request(request, &self.auth, reference_code.clone(), None);
        let body = serde_json::to_value(&wire_request)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let (response, raw) = self
            .call(services, "/payments", &reference_code, body, signature)
            .await?;
        Ok(to_payment_response(response, request.amount, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Paycell {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let reference_code = request.reference_id.clone().unwrap_or_else(common_utils::id::generate_uuid);
        let state = domain_types::callback_state::CallbackState {
            payment_id: reference_code.clone(),
            tenant_id: services.tenant_id,
            amount: request.amount,
            currency: request.currency,
            log_id: services.log_id.to_owned(),
            provider: Provider::Paycell,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Paycell, &token);

        let amount = request.amount.to_major_unit_string();
        let currency = request.currency.to_string();
        let signature = sign(&self.auth, &reference_code, &amount, &currency)?;

        let wire_request =
            build_payment_request(request, &self.auth, reference_code.clone(), Some(return_url));
        let body = serde_json::to_value(&wire_request)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let (response, raw) = self
            .call(services, "/payments", &reference_code, body, signature)
            .await?;
        let payment_response = to_payment_response(response, request.amount, request.currency, raw);
        payment_response.check_3d_pending_invariant()?;
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Paycell {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &Complete3DPaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let reference_code = request
            .callback_data
            .get("referenceCode")
            .cloned()
            .unwrap_or_else(|| request.state.payment_id.clone());
        let amount = request.state.amount.to_major_unit_string();
        let currency = request.state.currency.to_string();
        let signature = sign(&self.auth, &reference_code, &amount, &currency)?;

        let body = serde_json::json!({ "terminalId": self.auth.terminal_id.clone().expose(), "referenceCode": reference_code });
        let path = "/payments/query";
        let (response, raw) = self
            .call(services, path, &reference_code, body, signature)
            .await?;
        Ok(to_payment_response(response, request.state.amount, request.state.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Paycell {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let signature = sign(&self.auth, &request.payment_id, "", "")?;
        let body = serde_json::json!({
            "terminalId": self.auth.terminal_id.clone().expose(),
            "referenceCode": request.payment_id,
        });
        let (response, raw) = self
            .call(services, "/payments/query", &request.payment_id, body, signature)
            .await?;
        let amount = common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO);
        Ok(to_payment_response(response, amount, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Paycell {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let signature = sign(&self.auth, &request.payment_id, "", "")?;
        let body = serde_json::json!({
            "terminalId": self.auth.terminal_id.clone().expose(),
            "referenceCode": request.payment_id,
        });
        let (response, raw) = self
            .call(services, "/payments/cancel", &request.payment_id, body, signature)
            .await?;
        let amount = common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO);
        Ok(to_payment_response(response, amount, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Paycell {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let amount = request.refund_amount.to_major_unit_string();
        let currency = request.currency.to_string();
        let signature = sign(&self.auth, &request.payment_id, &amount, &currency)?;
        let body = serde_json::json!({
            "terminalId": self.auth.terminal_id.clone().expose(),
            "referenceCode": request.payment_id,
            "amount": amount,
        });
        let (response, _raw) = self
            .call(services, "/payments/refund", &request.payment_id, body, signature)
            .await?;

        let success = response.response_code == "0000";
        Ok(RefundResponse {
            success,
            status: if success {
                common_enums::RefundStatus::Succeeded
            } else {
                common_enums::RefundStatus::Failed
            },
            refund_id: response.reference_code.clone().unwrap_or_default(),
            payment_id: request.payment_id.clone(),
            refunded_amount: request.refund_amount,
            currency: request.currency,
            message: response.response_message.clone(),
            error_code: if success {
                None
            } else {
                Some(canonical_decline_code(&response.response_code).to_owned())
            },
        })
    }
}

impl IncomingWebhook for Paycell {
    fn validate_webhook(
        &self,
        _request: &RequestDetails,
    ) -> ConnectorResult<Option<WebhookDetails>> {
        Ok(None)
    }

    fn requires_status_refetch(&self) -> bool {
        true
    }
}

impl ConnectorServiceTrait for Paycell {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_has_three_fields() {
        let paycell = Paycell {
            auth: PaycellAuthType {
                merchant_id: masking::Secret::new("m".to_owned()),
                terminal_id: masking::Secret::new("t".to_owned()),
                secret_key: masking::Secret::new("s".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&paycell, Environment::Sandbox);
        assert_eq!(fields.len(), 3);
    }
}
