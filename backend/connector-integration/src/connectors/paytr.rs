//! PayTR: hosted-token payments API, form-urlencoded transport, a single
//! HMAC-SHA256 token shared across the initiation and callback legs.

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
    canonical_decline_code, sign, to_payment_response, webhook_hash, PaytrAuthType, PaytrResponse,
};

pub struct Paytr {
    auth: PaytrAuthType,
}

impl Paytr {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: PaytrAuthType::from_config(config)?,
        })
    }

    async fn call(
        &self,
        services: &DriverServices<'_>,
        path: &str,
        payment_id: &str,
        form: Vec<(String, String)>,
    ) -> ConnectorResult<(PaytrResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let url = format!(
            "{}{path}",
            services
                .connectors
                .for_provider(Provider::Paytr)
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
                provider: Provider::Paytr,
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
                "PayTR responded with status {}",
                raw.status_code
            ))
            .into());
        }

        let parsed: PaytrResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

fn mask_form(form: &[(String, String)]) -> serde_json::Value {
    let masked: Vec<(String, String)> = form
        .iter()
        .map(|(key, value)| match key.as_str() {
            "cc_owner" | "card_number" => (key.clone(), common_utils::pan::mask_card_number(value)),
            "cvv" => (key.clone(), common_utils::pan::elide_cvv().to_owned()),
            "expiry_month" | "expiry_year" => (key.clone(), "***".to_owned()),
            _ => (key.clone(), value.clone()),
        })
        .collect();
    serde_json::to_value(masked).unwrap_or(serde_json::Value::Null)
}

impl interfaces::api::ConnectorCommon for Paytr {
    fn id(&self) -> Provider {
        Provider::Paytr
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.for_provider(Provider::Paytr).base_url(Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("merchantId", "123456"),
            ConfigField::required("merchantKey", "paytr-merchant-key"),
            ConfigField::required("merchantSalt", "paytr-merchant-salt"),
        ]
    }
}

fn order_id_for(request: &PaymentRequest) -> String {
    request
        .reference_id
        .clone()
        .unwrap_or_else(common_utils::id::generate_uuid)
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Paytr {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let order_id = order_id_for(request);
        let amount_minor = request.amount.to_minor_unit(2).to_string();
        let user_ip = request.client_ip.clone().unwrap_or_else(|| "127.0.0.1".to_owned());
        let ok_url = request.callback_url.clone().unwrap_or_default();
        let fail_url = ok_url.clone();
        let currency = request.currency.to_string();
        let token = sign(&self.auth, &user_ip, &order_id, &amount_minor, &ok_url, &fail_url, &currency)?;

        let form = vec![
            ("merchant_id".to_owned(), self.auth.merchant_id.clone().expose()),
            ("user_ip".to_owned(), user_ip),
            ("merchant_oid".to_owned(), order_id.clone()),
            ("payment_amount".to_owned(), amount_minor),
            ("currency".to_owned(), currency),
            ("merchant_ok_url".to_owned(), ok_url),
            ("merchant_fail_url".to_owned(), fail_url),
            ("no_installment".to_owned(), "0".to_owned()),
            ("max_installment".to_owned(), "1".to_owned()),
            ("cc_owner".to_owned(), request.card_info.holder_name.clone().expose()),
            ("card_number".to_owned(), request.card_info.card_number.clone().expose()),
            ("expiry_month".to_owned(), request.card_info.expire_month.clone().expose()),
            ("expiry_year".to_owned(), request.card_info.expire_year.clone().expose()),
            ("cvv".to_owned(), request.card_info.cvv.clone().expose()),
            ("paytr_token".to_owned(), token),
        ];
        let (response, raw) = self.call(services, "/odeme", &order_id, form).await?;
        Ok(to_payment_response(response, request.amount, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Paytr {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let order_id = order_id_for(request);
        let state = domain_types::callback_state::CallbackState {
            payment_id: order_id.clone(),
            tenant_id: services.tenant_id,
            amount: request.amount,
            currency: request.currency,
            log_id: services.log_id.to_owned(),
            provider: Provider::Paytr,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Paytr, &token);

        let amount_minor = request.amount.to_minor_unit(2).to_string();
        let user_ip = request.client_ip.clone().unwrap_or_else(|| "127.0.0.1".to_owned());
        let currency = request.currency.to_string();
        let signed_token = sign(
            &self.auth,
            &user_ip,
            &order_id,
            &amount_minor,
            &return_url,
            &return_url,
            &currency,
        )?;

        let form = vec![
            ("merchant_id".to_owned(), self.auth.merchant_id.clone().expose()),
            ("user_ip".to_owned(), user_ip),
            ("merchant_oid".to_owned(), order_id.clone()),
            ("payment_amount".to_owned(), amount_minor),
            ("currency".to_owned(), currency),
            ("merchant_ok_url".to_owned(), return_url.clone()),
            ("merchant_fail_url".to_owned(), return_url),
            ("no_installment".to_owned(), "0".to_owned()),
            ("max_installment".to_owned(), "1".to_owned()),
            ("cc_owner".to_owned(), request.card_info.holder_name.clone().expose()),
            ("card_number".to_owned(), request.card_info.card_number.clone().expose()),
            ("expiry_month".to_owned(), request.card_info.expire_month.clone().expose()),
            ("expiry_year".to_owned(), request.card_info.expire_year.clone().expose()),
            ("cvv".to_owned(), request.card_info.cvv.clone().expose()),
            ("paytr_token".to_owned(), signed_token),
        ];
        let (response, raw) = self.call(services, "/odeme", &order_id, form).await?;
        let payment_response = to_payment_response(response, request.amount, request.currency, raw);
        payment_response.check_3d_pending_invariant()?;
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Paytr {
    async fn execute(
        &self,
        _services: &DriverServices<'_>,
        request: &Complete3DPaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let merchant_oid = request
            .callback_data
            .get("merchant_oid")
            .cloned()
            .unwrap_or_else(|| request.state.payment_id.clone());
        let status = request
            .callback_data
            .get("status")
            .cloned()
            .unwrap_or_else(|| "failed".to_owned());
        let total_amount = request
            .callback_data
            .get("total_amount")
            .cloned()
            .unwrap_or_else(|| request.state.amount.to_minor_unit(2).to_string());
        let hash = request.callback_data.get("hash").cloned().unwrap_or_default();
        let expected = webhook_hash(&self.auth, &merchant_oid, &status, &total_amount)?;
        if !expected.eq_ignore_ascii_case(&hash) {
            return Err(ConnectorError::WebhookSignatureMismatch.into());
        }

        let response = PaytrResponse {
            status: status.clone(),
            reason: request.callback_data.get("failed_reason_msg").cloned(),
            token: None,
            merchant_oid: Some(merchant_oid),
        };
        Ok(to_payment_response(
            response,
            request.state.amount,
            request.state.currency,
            serde_json::Value::Null,
        ))
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Paytr {
    async fn execute(
        &self,
        _services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        Err(Report::new(ConnectorError::NotImplemented(format!(
            "PayTR has no direct status-query API for payment_id={}; rely on the callback or webhook",
            request.payment_id
        ))))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Paytr {
    async fn execute(
        &self,
        _services: &DriverServices<'_>,
        _request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        Err(ConnectorError::NotImplemented("PayTR does not support cancellation before settlement".to_owned()).into())
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Paytr {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let form = vec![
            ("merchant_id".to_owned(), self.auth.merchant_id.clone().expose()),
            ("merchant_oid".to_owned(), request.payment_id.clone()),
            (
                "return_amount".to_owned(),
                request.refund_amount.to_minor_unit(2).to_string(),
            ),
        ];
        let (response, _raw) = self.call(services, "/odeme/iade", &request.payment_id, form).await?;

        let success = response.status == "success";
        Ok(RefundResponse {
            success,
            status: if success {
                common_enums::RefundStatus::Succeeded
            } else {
                common_enums::RefundStatus::Failed
            },
            refund_id: response.merchant_oid.clone().unwrap_or_default(),
            payment_id: request.payment_id.clone(),
            refunded_amount: request.refund_amount,
            currency: request.currency,
            message: response.reason.clone(),
            error_code: if success {
                None
            } else {
                Some(canonical_decline_code(response.reason.as_deref().unwrap_or_default()).to_owned())
            },
        })
    }
}

impl IncomingWebhook for Paytr {
    fn validate_webhook(&self, request: &RequestDetails) -> ConnectorResult<Option<WebhookDetails>> {
        let body_str = request.body_as_str();
        let form: std::collections::HashMap<String, String> = url::form_urlencoded::parse(body_str.as_bytes())
            .into_owned()
            .collect();
        let merchant_oid = form.get("merchant_oid").cloned().unwrap_or_default();
        let status = form.get("status").cloned().unwrap_or_default();
        let total_amount = form.get("total_amount").cloned().unwrap_or_default();
        let hash = form.get("hash").cloned().unwrap_or_default();
        let expected = webhook_hash(&self.auth, &merchant_oid, &status, &total_amount)?;
        if !expected.eq_ignore_ascii_case(&hash) {
            return Err(ConnectorError::WebhookSignatureMismatch.into());
        }

        Ok(Some(WebhookDetails {
            payment_id: Some(merchant_oid.clone()),
            reference_no: Some(merchant_oid),
            transaction_id: form.get("merchant_oid").cloned(),
            status: Some(status),
            raw: serde_json::to_value(&form).unwrap_or(serde_json::Value::Null),
        }))
    }
}

impl ConnectorServiceTrait for Paytr {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_names_three_fields() {
        let paytr = Paytr {
            auth: PaytrAuthType {
                merchant_id: masking::Secret::new("m".to_owned()),
                merchant_key: masking::Secret::new("k".to_owned()),
                merchant_salt: masking::Secret::new("s".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&paytr, Environment::Sandbox);
        assert_eq!(fields.len(), 3);
    }
}
