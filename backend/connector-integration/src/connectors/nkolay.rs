//! Nkolay: multipart form fields, per-endpoint field ordering, "pack-hex"
//! signing, and a cancel flow that echoes the original payment's logged
//! `systemTime` back out of the request log.

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
    cancel_signature, canonical_decline_code, detail_signature, generate_system_time,
    payment_signature, reference_code_for, refund_signature, to_payment_response,
    trx_date_from_system_time, NkolayAuthType, NkolayResponse,
};

/// The `type` term in Nkolay's cancel signature input
/// (`sx+referenceCode+type+trxDate+secretKey`).
const CANCEL_TXN_TYPE: &str = "cancel";

pub struct Nkolay {
    auth: NkolayAuthType,
}

impl Nkolay {
    pub fn initialize(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            auth: NkolayAuthType::from_config(config)?,
        })
    }

    async fn call(
        &self,
        services: &DriverServices<'_>,
        path: &str,
        payment_id: &str,
        fields: Vec<(String, String)>,
    ) -> ConnectorResult<(NkolayResponse, serde_json::Value)> {
        let started_at = time::OffsetDateTime::now_utc();
        let url = format!(
            "{}{path}",
            services
                .connectors
                .for_provider(Provider::Nkolay)
                .base_url(services.environment)
        );

        let request = RequestBuilder::new()
            .method(Method::Post)
            .url(url)
            .body(RequestContent::FormData(fields.clone()))
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
                provider: Provider::Nkolay,
                payment_id: payment_id.to_owned(),
                endpoint: path.to_owned(),
                client_request: serde_json::Value::Null,
                provider_request: mask_fields(&fields),
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
                "Nkolay responded with status {}",
                raw.status_code
            ))
            .into());
        }

        let parsed: NkolayResponse = serde_json::from_value(provider_response.clone())
            .change_context(ConnectorError::ResponseDeserializationFailed)?;
        Ok((parsed, provider_response))
    }
}

fn mask_fields(fields: &[(String, String)]) -> serde_json::Value {
    let masked: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| {
            let value = match k.as_str() {
                "cardNumber" => common_utils::pan::mask_card_number(v),
                "cvv" => common_utils::pan::elide_cvv().to_owned(),
                _ => v.clone(),
            };
            (k.clone(), serde_json::Value::String(value))
        })
        .collect();
    serde_json::Value::Object(masked)
}

impl interfaces::api::ConnectorCommon for Nkolay {
    fn id(&self) -> Provider {
        Provider::Nkolay
    }

    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str {
        connectors.for_provider(Provider::Nkolay).base_url(Environment::Sandbox)
    }

    fn get_required_config(&self, _environment: Environment) -> Vec<ConfigField> {
        vec![
            ConfigField::required("merchantId", "1000000"),
            ConfigField::required("secret", "nkolay-secret"),
            ConfigField::required("sx", "nkolay-session-token"),
        ]
    }
}

#[async_trait]
impl ConnectorIntegration<CreatePayment, PaymentRequest, PaymentResponse> for Nkolay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let reference_code = reference_code_for(request);
        let amount = request.amount.to_major_unit_string();
        let currency = request.currency.to_string();
        let system_time = generate_system_time();
        // No 3-D redirect on this path; Nkolay still requires successUrl/failUrl
        // on every `payment` call, so both point at the client's own callback.
        let success_url = request.callback_url.clone().unwrap_or_default();
        let fail_url = success_url.clone();
        let rnd = common_utils::id::generate_uuid();
        let signature = payment_signature(&self.auth, &reference_code, &amount, &success_url, &fail_url, &rnd);

        let fields = vec![
            ("sx".to_owned(), self.auth.sx.clone().expose()),
            ("merchantId".to_owned(), self.auth.merchant_id.clone().expose()),
            ("referenceCode".to_owned(), reference_code.clone()),
            ("amount".to_owned(), amount),
            ("currency".to_owned(), currency),
            ("successUrl".to_owned(), success_url),
            ("failUrl".to_owned(), fail_url),
            ("rnd".to_owned(), rnd),
            ("systemTime".to_owned(), system_time),
            ("cardNumber".to_owned(), request.card_info.card_number.clone().expose()),
            ("cardHolder".to_owned(), request.card_info.holder_name.clone().expose()),
            ("expireMonth".to_owned(), request.card_info.expire_month.clone().expose()),
            ("expireYear".to_owned(), request.card_info.expire_year.clone().expose()),
            ("cvv".to_owned(), request.card_info.cvv.clone().expose()),
            ("signature".to_owned(), signature),
        ];

        let (response, raw) = self
            .call(services, "/payment", &reference_code, fields)
            .await?;
        Ok(to_payment_response(response, request.amount, request.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<Create3DPayment, PaymentRequest, PaymentResponse> for Nkolay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &PaymentRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let reference_code = reference_code_for(request);
        let state = domain_types::callback_state::CallbackState {
            payment_id: reference_code.clone(),
            tenant_id: services.tenant_id,
            amount: request.amount,
            currency: request.currency,
            log_id: services.log_id.to_owned(),
            provider: Provider::Nkolay,
            environment: services.environment,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: request.callback_url.clone().unwrap_or_default(),
            client_ip: request.client_ip.clone(),
        };
        let token = services.correlator.mint(state).await;
        let return_url =
            crate::utils::build_token_return_url(services.gateway_base_url, Provider::Nkolay, &token);

        let amount = request.amount.to_major_unit_string();
        let currency = request.currency.to_string();
        let system_time = generate_system_time();
        // Both the success and failure legs route through the same
        // correlator-token return URL; Complete3DPayment tells them apart
        // from the provider's own callback payload.
        let success_url = return_url.clone();
        let fail_url = return_url.clone();
        let rnd = common_utils::id::generate_uuid();
        let signature = payment_signature(&self.auth, &reference_code, &amount, &success_url, &fail_url, &rnd);

        let fields = vec![
            ("sx".to_owned(), self.auth.sx.clone().expose()),
            ("merchantId".to_owned(), self.auth.merchant_id.clone().expose()),
            ("referenceCode".to_owned(), reference_code.clone()),
            ("amount".to_owned(), amount),
            ("currency".to_owned(), currency),
            ("successUrl".to_owned(), success_url),
            ("failUrl".to_owned(), fail_url),
            ("rnd".to_owned(), rnd),
            ("systemTime".to_owned(), system_time),
            ("cardNumber".to_owned(), request.card_info.card_number.clone().expose()),
            ("cardHolder".to_owned(), request.card_info.holder_name.clone().expose()),
            ("expireMonth".to_owned(), request.card_info.expire_month.clone().expose()),
            ("expireYear".to_owned(), request.card_info.expire_year.clone().expose()),
            ("cvv".to_owned(), request.card_info.cvv.clone().expose()),
            ("threeDForce".to_owned(), "true".to_owned()),
            ("signature".to_owned(), signature),
        ];

        let (response, raw) = self
            .call(services, "/payment", &reference_code, fields)
            .await?;
        let payment_response = to_payment_response(response, request.amount, request.currency, raw);
        payment_response.check_3d_pending_invariant()?;
        Ok(payment_response)
    }
}

#[async_trait]
impl ConnectorIntegration<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse> for Nkolay {
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
        let signature = detail_signature(&self.auth, &reference_code);
        let fields = vec![
            ("sx".to_owned(), self.auth.sx.clone().expose()),
            ("merchantId".to_owned(), self.auth.merchant_id.clone().expose()),
            ("referenceCode".to_owned(), reference_code.clone()),
            ("signature".to_owned(), signature),
        ];
        let (response, raw) = self.call(services, "/detail", &reference_code, fields).await?;
        Ok(to_payment_response(response, request.state.amount, request.state.currency, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse> for Nkolay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &GetPaymentStatusRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let signature = detail_signature(&self.auth, &request.payment_id);
        let fields = vec![
            ("sx".to_owned(), self.auth.sx.clone().expose()),
            ("merchantId".to_owned(), self.auth.merchant_id.clone().expose()),
            ("referenceCode".to_owned(), request.payment_id.clone()),
            ("signature".to_owned(), signature),
        ];
        let (response, raw) = self
            .call(services, "/detail", &request.payment_id, fields)
            .await?;
        let amount = common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO);
        Ok(to_payment_response(response, amount, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<CancelPayment, CancelRequest, PaymentResponse> for Nkolay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &CancelRequest,
    ) -> ConnectorResult<PaymentResponse> {
        let system_time = services
            .logger
            .get_provider_request_field(Provider::Nkolay, &request.payment_id, "systemTime")
            .await
            .unwrap_or_else(generate_system_time);
        let trx_date = trx_date_from_system_time(&system_time);

        let signature = cancel_signature(&self.auth, &request.payment_id, CANCEL_TXN_TYPE, &trx_date);
        let fields = vec![
            ("sx".to_owned(), self.auth.sx.clone().expose()),
            ("merchantId".to_owned(), self.auth.merchant_id.clone().expose()),
            ("referenceCode".to_owned(), request.payment_id.clone()),
            ("type".to_owned(), CANCEL_TXN_TYPE.to_owned()),
            ("trxDate".to_owned(), trx_date),
            ("signature".to_owned(), signature),
        ];
        let (response, raw) = self
            .call(services, "/cancel", &request.payment_id, fields)
            .await?;
        let amount = common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO);
        Ok(to_payment_response(response, amount, common_enums::Currency::TRY, raw))
    }
}

#[async_trait]
impl ConnectorIntegration<RefundPayment, RefundRequest, RefundResponse> for Nkolay {
    async fn execute(
        &self,
        services: &DriverServices<'_>,
        request: &RefundRequest,
    ) -> ConnectorResult<RefundResponse> {
        let amount = request.refund_amount.to_major_unit_string();
        let trx_date = time::OffsetDateTime::now_utc().date().to_string();
        let signature = refund_signature(&self.auth, &request.payment_id, &amount, &trx_date);

        let fields = vec![
            ("sx".to_owned(), self.auth.sx.clone().expose()),
            ("merchantId".to_owned(), self.auth.merchant_id.clone().expose()),
            ("referenceCode".to_owned(), request.payment_id.clone()),
            ("amount".to_owned(), amount),
            ("trxDate".to_owned(), trx_date),
            ("signature".to_owned(), signature),
        ];
        let (response, _raw) = self
            .call(services, "/refund", &request.payment_id, fields)
            .await?;

        let success = response.result_code == "00";
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
            message: response.result_message.clone(),
            error_code: if success {
                None
            } else {
                Some(canonical_decline_code(&response.result_code).to_owned())
            },
        })
    }
}

impl IncomingWebhook for Nkolay {
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

impl ConnectorServiceTrait for Nkolay {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_config_has_three_fields() {
        let nkolay = Nkolay {
            auth: NkolayAuthType {
                merchant_id: masking::Secret::new("m".to_owned()),
                secret: masking::Secret::new("s".to_owned()),
                sx: masking::Secret::new("sx".to_owned()),
            },
        };
        let fields = interfaces::api::ConnectorCommon::get_required_config(&nkolay, Environment::Sandbox);
        assert_eq!(fields.len(), 3);
    }
}
