//! C4, the payment service / dispatcher: selects the driver
//! instance for `(tenant, provider)`, enforces the request-level
//! invariants, allocates the per-exchange `logId`, and folds driver-internal
//! errors into the gateway-wide `GatewayError` taxonomy.
//! This is the one place `connector-integration`, `external-services`
//! and `domain_types` all meet; the HTTP layer (`routes.rs`) never talks to
//! a driver directly.

use std::collections::HashMap;
use std::sync::Arc;

use common_enums::{Environment, PaymentStatus, Provider};
use domain_types::callback_state::CallbackState;
use domain_types::connector_flow::{
    CancelPayment, Complete3DPayment, Create3DPayment, CreatePayment, GetPaymentStatus,
    RefundPayment,
};
use domain_types::errors::{ConnectorError, GatewayError, GatewayResult};
use domain_types::types::{
    CancelRequest, GetPaymentStatusRequest, PaymentRequest, PaymentResponse, RefundRequest,
    RefundResponse,
};
use error_stack::{Report, ResultExt};
use interfaces::connector_integration::DriverServices;
use interfaces::connector_service::Complete3DPaymentRequest;
use interfaces::webhook::WebhookDetails;
use interfaces::{ConnectorIntegration, ConnectorServiceTrait};

use crate::state::AppState;

/// Outcome of resolving a 3-D Secure callback: the reconstructed state (so
/// the route handler knows where to redirect) plus the driver's final
/// answer.
pub struct CallbackOutcome {
    pub state: CallbackState,
    pub response: GatewayResult<PaymentResponse>,
}

/// Outcome of webhook validation: `valid=false` with no details means the
/// provider declared failure or had nothing to say; the route still
/// responds 200 in that case, since only a signature mismatch is treated
/// as a hard error.
pub struct WebhookOutcome {
    pub valid: bool,
    pub details: Option<WebhookDetails>,
}

pub struct Dispatcher {
    state: Arc<AppState>,
}

impl Dispatcher {
    pub fn new(state: Arc<AppState>) -> Self {
        Self { state }
    }

    /// Builds a fresh driver instance for `(tenant, provider, environment)`
    /// from the resolver's current config map. Not cached: `Initialize`
    /// only extracts credentials into immutable fields, so rebuilding per
    /// call is cheap and trivially satisfies the "rebuilt when its config
    /// row changes" driver lifecycle rule without a cache-invalidation
    /// channel between C3 and C4 (see DESIGN.md).
    fn driver_for(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
    ) -> GatewayResult<Arc<dyn ConnectorServiceTrait>> {
        let validator = self.state.registry.config_validator(provider).map_err(map_connector_err)?;
        let config = self
            .state
            .resolver
            .get_map(tenant_id, provider, environment, validator.as_ref())
            .map_err(map_connector_err)?;

        self.state.registry.create(provider, &config).map_err(map_connector_err)
    }

    fn services<'a>(
        &'a self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        log_id: &'a str,
    ) -> DriverServices<'a> {
        DriverServices {
            http: self.state.http.as_ref(),
            correlator: self.state.correlator.as_ref(),
            logger: self.state.logger.as_ref(),
            connectors: &self.state.connectors,
            gateway_base_url: &self.state.gateway_base_url,
            environment,
            tenant_id,
            provider,
            log_id,
        }
    }

    fn new_log_id() -> String {
        common_utils::id::generate_gopay_id(time::OffsetDateTime::now_utc().unix_timestamp())
    }

    /// `CreatePayment`: preconditions, `logId` allocation,
    /// driver resolution, and the non-3D/3-D branch. Registers the settled
    /// amount in the refund ledger on success, for partial-refund support.
    pub async fn create_payment(
        &self,
        tenant_id: i64,
        provider: Provider,
        mut request: PaymentRequest,
    ) -> GatewayResult<PaymentResponse> {
        request.tenant_id = tenant_id;
        request.log_id = Self::new_log_id();
        request.validate_preconditions().map_err(map_connector_err)?;

        let environment = request.environment;
        let driver = self.driver_for(tenant_id, provider, environment)?;
        let services = self.services(tenant_id, provider, environment, &request.log_id);

        let result = if request.use_3d {
            ConnectorIntegration::<Create3DPayment, PaymentRequest, PaymentResponse>::execute(
                driver.as_ref(),
                &services,
                &request,
            )
            .await
        } else {
            ConnectorIntegration::<CreatePayment, PaymentRequest, PaymentResponse>::execute(
                driver.as_ref(),
                &services,
                &request,
            )
            .await
        };

        let response = result.map_err(map_connector_err)?;
        if response.status == PaymentStatus::Successful {
            self.state.record_settled_amount(
                provider,
                tenant_id,
                &request.conversation_id_or_generated(),
                response.amount,
            );
        }
        Ok(response)
    }

    /// Resolve a 3-D Secure callback — by correlator token
    /// when present, by the legacy `(tenantId, paymentId)` fallback
    /// otherwise — and invoke the driver's `Complete3DPayment`.
    pub async fn complete_callback(
        &self,
        provider: Provider,
        token: Option<&str>,
        legacy_tenant_id: Option<i64>,
        legacy_payment_id: Option<&str>,
        legacy_original_callback_url: Option<&str>,
        callback_data: HashMap<String, String>,
    ) -> GatewayResult<CallbackOutcome> {
        let mut state = match token {
            Some(token) => self.state.correlator.resolve(token).await,
            None => match (legacy_tenant_id, legacy_payment_id) {
                (Some(tenant_id), Some(payment_id)) => {
                    self.state
                        .correlator
                        .resolve_legacy(provider, tenant_id, payment_id)
                        .await
                }
                _ => None,
            },
        }
        .ok_or_else(|| Report::new(GatewayError::Correlator))?;

        // The legacy index cannot recover `originalCallback` (it is never
        // logged); the legacy query string carries it instead.
        if token.is_none() {
            if let Some(url) = legacy_original_callback_url {
                state.original_callback = url.to_owned();
            }
        }

        let driver = self.driver_for(state.tenant_id, provider, state.environment)?;
        let services = self.services(state.tenant_id, provider, state.environment, &state.log_id);

        let complete_request = Complete3DPaymentRequest {
            state: state.clone(),
            callback_data,
        };

        let result = ConnectorIntegration::<Complete3DPayment, Complete3DPaymentRequest, PaymentResponse>::execute(
            driver.as_ref(),
            &services,
            &complete_request,
        )
        .await
        .map_err(map_connector_err);

        if let Ok(response) = &result {
            if response.status == PaymentStatus::Successful {
                self.state
                    .record_settled_amount(provider, state.tenant_id, &state.payment_id, response.amount);
            }
        }

        Ok(CallbackOutcome { state, response: result })
    }

    /// `GetPaymentStatus`, with the refund ledger's
    /// `Refunded` override applied: a full refund flips the
    /// payment's reported status even though the driver has no notion of
    /// gateway-side refund accumulation.
    pub async fn get_payment_status(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        request: GetPaymentStatusRequest,
    ) -> GatewayResult<PaymentResponse> {
        let driver = self.driver_for(tenant_id, provider, environment)?;
        let log_id = Self::new_log_id();
        let services = self.services(tenant_id, provider, environment, &log_id);

        let mut response = ConnectorIntegration::<GetPaymentStatus, GetPaymentStatusRequest, PaymentResponse>::execute(
            driver.as_ref(),
            &services,
            &request,
        )
        .await
        .map_err(map_connector_err)?;

        if self.state.is_fully_refunded(provider, &request.payment_id) {
            response.status = PaymentStatus::Refunded;
        }
        Ok(response)
    }

    /// `CancelPayment`.
    pub async fn cancel_payment(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        request: CancelRequest,
    ) -> GatewayResult<PaymentResponse> {
        let driver = self.driver_for(tenant_id, provider, environment)?;
        let log_id = Self::new_log_id();
        let services = self.services(tenant_id, provider, environment, &log_id);

        ConnectorIntegration::<CancelPayment, CancelRequest, PaymentResponse>::execute(driver.as_ref(), &services, &request)
            .await
            .map_err(map_connector_err)
    }

    /// `RefundPayment`, guarded by the refund ledger: rejects
    /// a refund that would exceed the original settled amount before the
    /// driver is ever called, surfacing a `ValidationError` instead.
    pub async fn refund_payment(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        request: RefundRequest,
    ) -> GatewayResult<RefundResponse> {
        if let Some(entry) = self.state.ledger_entry(provider, &request.payment_id) {
            if entry.tenant_id != 0 && entry.tenant_id != tenant_id {
                return Err(Report::new(GatewayError::Validation {
                    message: "payment does not belong to this tenant".to_owned(),
                }));
            }
            let would_be_total = entry.refunded_total.as_decimal() + request.refund_amount.as_decimal();
            if would_be_total > entry.original_amount.as_decimal() {
                return Err(Report::new(GatewayError::Validation {
                    message: "refund amount exceeds remaining refundable amount".to_owned(),
                }));
            }
        }

        let driver = self.driver_for(tenant_id, provider, environment)?;
        let log_id = Self::new_log_id();
        let services = self.services(tenant_id, provider, environment, &log_id);

        let response = ConnectorIntegration::<RefundPayment, RefundRequest, RefundResponse>::execute(
            driver.as_ref(),
            &services,
            &request,
        )
        .await
        .map_err(map_connector_err)?;

        if response.success {
            self.state.accumulate_refund(provider, &request.payment_id, request.refund_amount);
        }
        Ok(response)
    }

    /// The webhook validator (C7). `tenant_id`/`environment`
    /// select which tenant's credentials verify the signature — see
    /// DESIGN.md for why the webhook route carries an explicit `tenantId`
    /// query parameter even though it has no authenticated session to
    /// derive one from.
    pub async fn validate_webhook(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        request: &domain_types::router_data::RequestDetails,
    ) -> GatewayResult<WebhookOutcome> {
        let driver = self.driver_for(tenant_id, provider, environment)?;

        match driver.validate_webhook(request) {
            Ok(Some(details)) => Ok(WebhookOutcome {
                valid: true,
                details: Some(details),
            }),
            Ok(None) => {
                // No signature scheme for this provider: re-fetch
                // authoritative status instead of trusting the webhook body.
                let payment_id = extract_payment_id_hint(&request.body).ok_or_else(|| {
                    Report::new(GatewayError::Validation {
                        message: "webhook carried no recognisable payment identifier".to_owned(),
                    })
                })?;
                let status = self
                    .get_payment_status(
                        tenant_id,
                        provider,
                        environment,
                        GetPaymentStatusRequest {
                            tenant_id,
                            payment_id: payment_id.clone(),
                        },
                    )
                    .await?;
                Ok(WebhookOutcome {
                    valid: true,
                    details: Some(WebhookDetails {
                        payment_id: Some(payment_id),
                        reference_no: None,
                        transaction_id: Some(status.transaction_id),
                        status: Some(status.status.to_string()),
                        raw: status.provider_response,
                    }),
                })
            }
            Err(report) => {
                if matches!(report.current_context(), ConnectorError::WebhookSignatureMismatch) {
                    Err(Report::new(GatewayError::Signature))
                } else {
                    Err(report.change_context(GatewayError::Validation {
                        message: "required webhook field missing".to_owned(),
                    }))
                }
            }
        }
    }
}

/// Folds a driver-internal failure into the gateway-wide error taxonomy,
/// preserving the error_stack context chain for diagnostics.
fn map_connector_err(report: Report<ConnectorError>) -> Report<GatewayError> {
    let gateway_err = GatewayError::from(report.current_context().clone());
    report.change_context(gateway_err)
}

/// Best-effort extraction of a payment identifier from an unsigned
/// JSON-or-form body. Used by the webhook status-refetch fallback
/// and by `routes.rs`'s legacy callback handler, which needs a `paymentId`
/// to key `resolve_legacy` with even though the legacy query string
/// (`?tenantId=…&originalCallbackUrl=…`) does not carry one directly.
pub(crate) fn extract_payment_id_hint(body: &[u8]) -> Option<String> {
    const JSON_FIELDS: [&str; 3] = ["paymentId", "conversationId", "orderId"];
    const FORM_FIELDS: [&str; 2] = ["merchant_oid", "txnid"];

    if let Ok(value) = serde_json::from_slice::<serde_json::Value>(body) {
        for field in JSON_FIELDS {
            if let Some(found) = value.get(field).and_then(|v| v.as_str()) {
                return Some(found.to_owned());
            }
        }
    }

    let body_str = String::from_utf8_lossy(body);
    let form: HashMap<String, String> = url::form_urlencoded::parse(body_str.as_bytes()).into_owned().collect();
    for field in FORM_FIELDS {
        if let Some(found) = form.get(field) {
            return Some(found.clone());
        }
    }
    None
}
