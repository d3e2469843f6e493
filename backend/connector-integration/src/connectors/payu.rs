//! PayU: form-urlencoded payments API, SHA-512 hex hash carried both ways
//! (request signing and response/webhook verification).

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
    build_form, canonical_decline_code, to_payment_response, verify_reverse_hash, PayuAuthType,
    PayuResponse,
};

pub struct Payu {
    auth: PayuAuthType,
}

impl Payu {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: PayuAuthType::from_config(config)?,
        })
    }

    async fn call(
        &self,
        services: &DriverServices<'_>,
        path: &str,
        payment_id: &str,
        form: Vec<(String, String)>,
    ) -> ConnectorResult<(PayuResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let url = format!(
            "{}{path}",
            services
                .connectors
                .for_provider(Provider::Payu)
                .base_url(services.environment)
        );

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url)
            .body(RequestContent::FormUrlEncoded(form.clone()))
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
                provider: Provider::Payu,
                payment_id: payment_id.to_owned(),
                endpoint: path.to_owned(),
                client_request: serde_json::Value::Null,
                provider_request: mask_form(&form),
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
                "PayU responded with status {}",
                raw.status_code
            ))
            .into());
        }

        let parsed: PayuResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

fn mask_form(form: &[(String, String)]) -> serde_json::Value {
    let masked: Vec<(String, String)> = form
        .iter()
        .map(|(key, value)| match key.as_str() {
            "ccnum" => (key.clone(), common_utils::pan::mask_card_number(value)),
            "ccvv" => (key.clone(), common_utils::pan::elide_cvv().to_owned()),
            "ccexpmon" | "ccexpyr" => (key.clone(), "***".to_owned()),
            _ => (key.clone(), value.clone()),
        })
        .collect();
    serde_json::to_value(masked).unwrap_or(serde_json::Value::Null)
}

impl interfaces::api::ConnectorCommon for Payu {
    fn id(&self) -> Provider {
        Provider::Payu
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.for_provider(Provider::Payu).base_url(Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("merchantKey", "payu-merchant-key"),
            ConfigField::required("merchantSalt", "payu-merchant-salt"),
        ]
    }
}

fn txnid_for(request: &PaymentRequest) -> String {
    request
        .reference_id
        .clone()
        .unwrap_or_else(common_utils::id::generate_uuid)
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Payu {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let txnid = txnid_for(request);
        let callback = request.callback_url.clone().unwrap_or_default();
        let form = build_form(request, &self.auth, txnid.clone(), callback.clone(), callback);
        let (response, raw) = self.call(services, "/_payment", &txnid, form).await?;
        Ok(to_payment_response(response, request.amount, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Payu {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let txnid = txnid_for(request);
        let state = domain_types::callback_state::CallbackState {
            payment_id: txnid.clone(),
            tenant_id: services.tenant_id,
            amount: request.amount,
            currency: request.currency,
            log_id: services.log_id.to_owned(),
            provider: Provider::Payu,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Payu, &token);

        let form = build_form(request, &self.auth, txnid.clone(), return_url.clone(), return_url);
        let (response, raw) = self.call(services, "/_payment", &txnid, form).await?;
        let payment_response = to_payment_response(response, request.amount, request.currency, raw);
        payment_response.check_3d_pending_invariant()?;
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Payu {
    async fn execute(
        &self,
        _services: &DriverServices<'_>,
        request: &Complete3DPaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let txnid = request
            .callback_data
            .get("txnid")
            .cloned()
            .unwrap_or_else(|| request.state.payment_id.clone());
        let status = request.callback_data.get("status").cloned().unwrap_or_else(|| "failure".to_owned());
        let amount = request.state.amount.to_major_unit_string();
        let productinfo = request.callback_data.get("productinfo").cloned().unwrap_or_else(|| "Payment".to_owned());
        let firstname = request.callback_data.get("firstname").cloned().unwrap_or_default();
        let email = request.callback_data.get("email").cloned().unwrap_or_default();
        let hash = request.callback_data.get("hash").cloned().unwrap_or_default();

        if !verify_reverse_hash(&self.auth, &txnid, &amount, &productinfo, &firstname, &email, &status, &hash) {
            return Err(ConnectorError::WebhookSignatureMismatch.into());
        }

        let mihpayid = request.callback_data.get("mihpayid").cloned();
        let response = PayuResponse {
            status: status.clone(),
            error: request.callback_data.get("error").cloned(),
            error_message: request.callback_data.get("error_Message").cloned(),
            mihpayid,
            txnid: Some(txnid),
        };
        let payment_response =
            to_payment_response(response, request.state.amount, request.state.currency, serde_json::Value::Null);
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Payu {
    async fn execute(
        &self,
        _services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        Err(Report::new(ConnectorError::NotImplemented(format!(
            "PayU has no direct status-query API for payment_id={}; rely on the callback or webhook",
            request.payment_id
        ))))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Payu {
    async fn execute(
        &self,
        _services: &DriverServices<'_>,
        _request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        Err(ConnectorError::NotImplemented("PayU does not support cancellation before settlement".to_owned()).into())
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Payu {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let form = vec![
            ("key".to_owned(), self.auth.merchant_key.clone().expose()),
            ("command".to_owned(), "cancel_refund_transaction".to_owned()),
            ("var1".to_owned(), request.payment_id.clone()),
            ("var3".to_owned(), request.refund_amount.to_major_unit_string()),
        ];
        let (response, _raw) = self
            .call(services, "/merchant/postservice", &request.payment_id, form)
            .await?;

        let success = response.status == "success";
        Ok(RefundResponse {
            success,
            status: if success {
                common_enums::RefundStatus::Succeeded
            } else {
                common_enums::RefundStatus::Failed
            },
            refund_id: response.mihpayid.clone().unwrap_or_default(),
            payment_id: request.payment_id.clone(),
            refunded_amount: request.refund_amount,
            currency: request.currency,
            message: response.error_message.clone(),
            error_code: response.error.as_deref().map(canonical_decline_code).map(str::to_owned),
        })
    }
}

impl IncomingWebhook for Payu {
    fn validate_webhook(&self, request: &RequestDetails) -> ConnectorResult<Option<WebhookDetails>> {
        let body_str = request.body_as_str();
        let form: std::collections::HashMap<String, String> =
            url::form_urlencoded::parse(body_str.as_bytes()).into_owned().collect();

        let txnid = form.get("txnid").cloned().unwrap_or_default();
        let status = form.get("status").cloned().unwrap_or_default();
        let amount = form.get("amount").cloned().unwrap_or_default();
        let productinfo = form.get("productinfo").cloned().unwrap_or_default();
        let firstname = form.get("firstname").cloned().unwrap_or_default();
        let email = form.get("email").cloned().unwrap_or_default();
        let hash = form.get("hash").cloned().unwrap_or_default();

        if !verify_reverse_hash(&self.auth, &txnid, &amount, &productinfo, &firstname, &email, &status, &hash) {
            return Err(ConnectorError::WebhookSignatureMismatch.into());
        }

        Ok(Some(WebhookDetails {
            payment_id: Some(txnid.clone()),
            reference_no: Some(txnid),
            transaction_id: form.get("mihpayid").cloned(),
            status: Some(status),
            raw: serde_json::to_value(&form).unwrap_or(serde_json::Value::Null),
        }))
    }
}

impl ConnectorServiceTrait for Payu {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_names_two_fields() {
        let payu = Payu {
            auth: PayuAuthType {
                merchant_key: masking::Secret::new("k".to_owned()),
                merchant_salt: masking::Secret::new("s".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&payu, Environment::Sandbox);
        assert_eq!(fields.len(), 2);
    }
}
