//! Stripe: bearer-token auth, form-encoded PaymentIntents API, and the real
//! `Stripe-Signature` webhook scheme.

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
    build_payment_intent_form, to_payment_response, verify_webhook_signature, StripeAuthType,
    StripeErrorResponse, StripePaymentIntentResponse,
};

pub struct Stripe {
    auth: StripeAuthType,
}

impl Stripe {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: StripeAuthType::from_config(config)?,
        })
    }

    async fn call(
        &self,
        services: &DriverServices<'_>,
        method: Method,
        path: &str,
        payment_id: &str,
        form: Option<Vec<(String, String)>>,
    ) -> ConnectorResult<(StripePaymentIntentResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let url = format!(
            "{}{path}",
            services
                .connectors
                .for_provider(Provider::Stripe)
                .base_url(services.environment)
        );

        let mut builder = RequestBuilder::new()
            .method(method)
            .url(url)
            .header("Authorization", self.auth.bearer_header());
        if let Some(fields) = form.clone() {
            builder = builder.body(RequestContent::FormUrlEncoded(fields));
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
                provider: Provider::Stripe,
                payment_id: payment_id.to_owned(),
                endpoint: path.to_owned(),
                client_request: serde_json::Value::Null,
                provider_request: mask_form(&form.unwrap_or_default()),
                provider_response: provider_response.clone(),
                status_code: Some(raw.status_code),
                error_code: None,
                error_message: None,
                started_at,
                ended_at,
            })
            .await;

        if !raw.is_success() {
            let error: Option<StripeErrorResponse> =
                serde_json::from_value(provider_response.clone()).ok();
            return Err(ConnectorError::ProviderDeclined {
                code: error
                    .as_ref()
                    .and_then(|e| e.error.code.clone())
                    .unwrap_or_else(|| "unknown".to_owned()),
                message: error
                    .and_then(|e| e.error.message)
                    .unwrap_or_else(|| "Stripe request failed".to_owned()),
            }
            .into());
        }

        let parsed: StripePaymentIntentResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

fn mask_form(form: &[(String, String)]) -> serde_json::Value {
    let masked: Vec<(String, String)> = form
        .iter()
        .map(|(k, v)| {
            if k.ends_with("[number]") {
                (k.clone(), common_utils::pan::mask_card_number(v))
            } else if k.ends_with("[cvc]") {
                (k.clone(), common_utils::pan::elide_cvv().to_owned())
            } else {
                (k.clone(), v.clone())
            }
        })
        .collect();
    serde_json::to_value(masked.into_iter().collect::<std::collections::BTreeMap<_, _>>())
        .unwrap_or(serde_json::Value::Null)
}

impl interfaces::api::ConnectorCommon for Stripe {
    fn id(&self) -> Provider {
        Provider::Stripe
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.for_provider(Provider::Stripe).base_url(Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("apiKey", "sk_test_..."),
            ConfigField::required("webhookSecret", "whsec_..."),
        ]
    }
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Stripe {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let payment_id = request.conversation_id_or_generated();
        let form = build_payment_intent_form(request, None);
        let (response, raw) = self
            .call(services, Method::Post, "/v1/payment_intents", &payment_id, Some(form))
            .await?;
        Ok(to_payment_response(response, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Stripe {
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
            provider: Provider::Stripe,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Stripe, &token);

        let form = build_payment_intent_form(request, Some(&return_url));
        let (response, raw) = self
            .call(services, Method::Post, "/v1/payment_intents", &payment_id, Some(form))
            .await?;
        let payment_response = to_payment_response(response, request.currency, raw);
        if payment_response.status == common_enums::PaymentStatus::Pending {
            payment_response.check_3d_pending_invariant()?;
        }
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Stripe {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &Complete3DPaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let payment_intent_id = request
            .callback_data
            .get("payment_intent")
            .cloned()
            .ok_or(ConnectorError::WebhookFieldMissing("payment_intent"))?;
        let path = format!("/v1/payment_intents/{payment_intent_id}");
        let (response, raw) = self
            .call(services, Method::Get, &path, &payment_intent_id, None)
            .await?;
        Ok(to_payment_response(response, request.state.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Stripe {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let path = format!("/v1/payment_intents/{}", request.payment_id);
        let (response, raw) = self
            .call(services, Method::Get, &path, &request.payment_id, None)
            .await?;
        Ok(to_payment_response(response, common_enums::Currency::USD, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Stripe {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let path = format!("/v1/payment_intents/{}/cancel", request.payment_id);
        let (response, raw) = self
            .call(services, Method::Post, &path, &request.payment_id, Some(vec![]))
            .await?;
        Ok(to_payment_response(response, common_enums::Currency::USD, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Stripe {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let form = vec![
            ("payment_intent".to_owned(), request.payment_id.clone()),
            (
                "amount".to_owned(),
                crate::utils::to_minor_units(request.refund_amount).to_string(),
            ),
        ];
        let result = self
            .call(services, Method::Post, "/v1/refunds", &request.payment_id, Some(form))
            .await;

        match result {
            Ok((_response, _raw)) => Ok(RefundResponse {
                success: true,
                status: common_enums::RefundStatus::Succeeded,
                refund_id: common_utils::id::generate_uuid(),
                payment_id: request.payment_id.clone(),
                refunded_amount: request.refund_amount,
                currency: request.currency,
                message: None,
                error_code: None,
            }),
            Err(report) => Ok(RefundResponse {
                success: false,
                status: common_enums::RefundStatus::Failed,
                refund_id: String::new(),
                payment_id: request.payment_id.clone(),
                refunded_amount: request.refund_amount,
                currency: request.currency,
                message: Some(report.to_string()),
                error_code: Some("UNKNOWN_RESPONSE".to_owned()),
            }),
        }
    }
}

impl IncomingWebhook for Stripe {
    fn validate_webhook(&self, request: &RequestDetails) -> ConnectorResult<Option<WebhookDetails>> {
        let signature_header = request
            .header("Stripe-Signature")
            .ok_or(ConnectorError::WebhookSignatureMismatch)?;
        verify_webhook_signature(signature_header, &request.body, &self.auth.webhook_secret)?;

        let body: serde_json::Value = serde_json::from_slice(&request.body)
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        let payment_intent = body.get("data").and_then(|d| d.get("object"));
        Ok(Some(WebhookDetails {
            payment_id: payment_intent
                .and_then(|o| o.get("id"))
                .and_then(|v| v.as_str())
                .map(str::to_owned),
            reference_no: None,
            transaction_id: payment_intent
                .and_then(|o| o.get("id"))
                .and_then(|v| v.as_str())
                .map(str::to_owned),
            status: payment_intent
                .and_then(|o| o.get("status"))
                .and_then(|v| v.as_str())
                .map(str::to_owned),
            raw: body,
        }))
    }
}

impl ConnectorServiceTrait for Stripe {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_names_both_keys() {
        let stripe = Stripe {
            auth: StripeAuthType {
                secret_key: masking::Secret::new("sk".to_owned()),
                webhook_secret: masking::Secret::new("whsec".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&stripe, Environment::Sandbox);
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn mask_form_hides_card_fields() {
        let form = vec![
            ("payment_method_data[card][number]".to_owned(), "4242424242424242".to_owned()),
            ("payment_method_data[card][cvc]".to_owned(), "123".to_owned()),
        ];
        let masked = mask_form(&form);
        assert_eq!(masked["payment_method_data[card][cvc]"], "***");
        assert_ne!(masked["payment_method_data[card][number]"], "4242424242424242");
    }
}
