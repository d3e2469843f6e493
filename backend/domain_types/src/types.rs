//! The request/response shapes of the payment API, plus the construction
//! and validation logic attached to them.

use common_enums::{Currency, Environment, PaymentStatus, Provider, RefundStatus};
use common_utils::types::MajorUnit;
use serde::{Deserialize, Serialize};

use crate::errors::{ConnectorError, ConnectorResult};
use crate::payment_address::{Customer, Item};
use crate::payment_method_data::CardInfo;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub tenant_id: i64,
    pub amount: MajorUnit,
    pub currency: Currency,
    #[serde(default)]
    pub use_3d: bool,
    pub callback_url: Option<String>,
    pub client_ip: Option<String>,
    pub client_user_agent: Option<String>,
    pub conversation_id: Option<String>,
    pub reference_id: Option<String>,
    pub description: Option<String>,
    pub customer: Customer,
    pub card_info: CardInfo,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default = "default_installment_count")]
    pub installment_count: u32,
    #[serde(default)]
    pub environment: Environment,
    /// Assigned by the dispatcher (C4) before the driver is invoked; absent
    /// on the wire.
    #[serde(skip_deserializing, default)]
    pub log_id: String,
}

fn default_installment_count() -> u32 {
    1
}

impl PaymentRequest {
    /// Enforces `tenantId` non-zero and the installment/callback
    /// preconditions the dispatcher is responsible for.
    /// Called before any driver is constructed.
    pub fn validate_preconditions(&self) -> ConnectorResult<()> {
        if self.tenant_id <= 0 {
            return Err(ConnectorError::InvalidDataFormat {
                field_name: "tenantId",
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }
        if !self.amount.is_positive() {
            return Err(ConnectorError::InvalidDataFormat {
                field_name: "amount",
                reason: "must be greater than zero".to_owned(),
            }
            .into());
        }
        if self.installment_count < 1 {
            return Err(ConnectorError::InvalidDataFormat {
                field_name: "installmentCount",
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }
        if self.use_3d && self.callback_url.as_deref().unwrap_or("").is_empty() {
            return Err(ConnectorError::MissingRequiredField {
                field_name: "callbackUrl",
            }
            .into());
        }
        if self.customer.email.is_empty() {
            return Err(ConnectorError::MissingRequiredField {
                field_name: "customer.email",
            }
            .into());
        }
        Ok(())
    }

    /// The conversation id to use for this request: the client's, or a
    /// freshly generated one.
    pub fn conversation_id_or_generated(&self) -> String {
        self.conversation_id
            .clone()
            .unwrap_or_else(common_utils::id::generate_uuid)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentResponse {
    pub success: bool,
    pub status: PaymentStatus,
    #[serde(default)]
    pub payment_id: String,
    #[serde(default)]
    pub transaction_id: String,
    pub amount: MajorUnit,
    pub currency: Currency,
    #[serde(default)]
    pub message: String,
    pub error_code: Option<String>,
    /// 3-D Secure: the ACS/provider redirect the client's browser must
    /// navigate to.
    pub redirect_url: Option<String>,
    /// 3-D Secure: the HTML form body the client must auto-submit, when the
    /// provider returns a form instead of a bare redirect.
    pub html: Option<String>,
    pub fraud_status: Option<String>,
    pub system_time: time::OffsetDateTime,
    /// Raw upstream payload, retained verbatim for the request log (C6),
    /// never returned to the client over the wire in full — the HTTP layer
    /// strips it before serialising the client-facing response.
    #[serde(skip)]
    pub provider_response: serde_json::Value,
}

impl PaymentResponse {
    /// Every `Pending` 3-D response must carry a redirect surface.
    pub fn check_3d_pending_invariant(&self) -> ConnectorResult<()> {
        if self.status == PaymentStatus::Pending
            && self.html.as_deref().unwrap_or("").is_empty()
            && self.redirect_url.as_deref().unwrap_or("").is_empty()
        {
            return Err(ConnectorError::InvalidDataFormat {
                field_name: "html|redirectUrl",
                reason: "a Pending 3-D response must carry html or redirectUrl".to_owned(),
            }
            .into());
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundRequest {
    pub tenant_id: i64,
    pub payment_id: String,
    pub refund_amount: MajorUnit,
    pub reason: Option<String>,
    pub description: Option<String>,
    pub conversation_id: Option<String>,
    pub currency: Currency,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefundResponse {
    pub success: bool,
    pub status: RefundStatus,
    #[serde(default)]
    pub refund_id: String,
    pub payment_id: String,
    pub refunded_amount: MajorUnit,
    pub currency: Currency,
    pub message: Option<String>,
    pub error_code: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelRequest {
    pub tenant_id: i64,
    pub payment_id: String,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetPaymentStatusRequest {
    pub tenant_id: i64,
    pub payment_id: String,
}

/// One provider/environment's reachable base URLs.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderEndpoints {
    pub sandbox_base_url: String,
    pub production_base_url: String,
}

impl ProviderEndpoints {
    pub fn base_url(&self, environment: Environment) -> &str {
        match environment {
            Environment::Sandbox => &self.sandbox_base_url,
            Environment::Production => &self.production_base_url,
        }
    }
}

/// Base URLs for every supported provider, loaded from configuration at
/// startup: each driver needs a sandbox and a production base URL.
#[derive(Debug, Clone, Deserialize)]
pub struct Connectors {
    pub iyzico: ProviderEndpoints,
    pub stripe: ProviderEndpoints,
    pub ozanpay: ProviderEndpoints,
    pub paycell: ProviderEndpoints,
    pub papara: ProviderEndpoints,
    pub nkolay: ProviderEndpoints,
    pub paytr: ProviderEndpoints,
    pub payu: ProviderEndpoints,
}

impl Connectors {
    pub fn for_provider(&self, provider: Provider) -> &ProviderEndpoints {
        match provider {
            Provider::Iyzico => &self.iyzico,
            Provider::Stripe => &self.stripe,
            Provider::Ozanpay => &self.ozanpay,
            Provider::Paycell => &self.paycell,
            Provider::Papara => &self.papara,
            Provider::Nkolay => &self.nkolay,
            Provider::Paytr => &self.paytr,
            Provider::Payu => &self.payu,
        }
    }
}

/// Outbound proxy configuration for the HTTP client every driver's
/// `HttpExecutor` shares ("the HTTP client they hold is safe for
/// concurrent use").
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Proxy {
    pub http_url: Option<String>,
    pub https_url: Option<String>,
    pub idle_pool_connection_timeout: Option<u64>,
    #[serde(default)]
    pub bypass_proxy_urls: Vec<String>,
}
