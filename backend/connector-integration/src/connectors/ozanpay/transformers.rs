//! OzanPay wire types: bearer-token JSON payments API, SHA-256 hex webhook
//! signature.

use common_enums::{Currency, PaymentStatus};
use domain_types::errors::ConnectorResult;
use domain_types::router_data::ConfigMap;
use domain_types::types::{PaymentRequest, PaymentResponse};
use masking::{ExposeInterface, Secret};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct OzanpayAuthType {
    pub api_key: Secret<String>,
    pub merchant_id: Secret<String>,
    pub secret_key: Secret<String>,
}

impl OzanpayAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            api_key: require_config_value(config, "apiKey")?,
            merchant_id: require_config_value(config, "merchantId")?,
            secret_key: require_config_value(config, "secretKey")?,
        })
    }

    pub fn bearer_header(&self) -> String {
        format!("Bearer {}", self.api_key.clone().expose())
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OzanpayCard {
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub holder_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OzanpayPaymentRequest {
    pub merchant_id: String,
    pub order_id: String,
    pub amount: i64,
    pub currency: String,
    pub card: OzanpayCard,
    pub customer_email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OzanpayPaymentResponse {
    pub status: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub redirect_url: Option<String>,
    #[serde(default)]
    pub html: Option<String>,
}

pub fn build_payment_request(
    req: &PaymentRequest,
    auth: &OzanpayAuthType,
    return_url: Option<String>,
) -> OzanpayPaymentRequest {
    OzanpayPaymentRequest {
        merchant_id: auth.merchant_id.clone().expose(),
        order_id: req.reference_id.clone().unwrap_or_else(common_utils::id::generate_uuid),
        amount: crate::utils::to_minor_units(req.amount),
        currency: req.currency.to_string(),
        card: OzanpayCard {
            number: req.card_info.card_number.clone().expose(),
            expiry_month: req.card_info.expire_month.clone().expose(),
            expiry_year: req.card_info.expire_year.clone().expose(),
            cvv: req.card_info.cvv.clone().expose(),
            holder_name: req.card_info.holder_name.clone().expose(),
        },
        customer_email: req.customer.email.clone(),
        return_url,
    }
}

pub fn map_status(status: &str) -> PaymentStatus {
    match status {
        "APPROVED" => PaymentStatus::Successful,
        "PENDING_3D" | "PENDING" => PaymentStatus::Pending,
        "VOIDED" => PaymentStatus::Cancelled,
        "REFUNDED" => PaymentStatus::Refunded,
        _ => PaymentStatus::Failed,
    }
}

/// ISO 8583-style two-digit response codes OzanPay echoes through
/// `errorCode`.
pub fn canonical_decline_code(provider_code: &str) -> &'static str {
    match provider_code {
        "51" => "INSUFFICIENT_FUNDS",
        "54" => "EXPIRED_CARD",
        "05" => "DO_NOT_HONOR",
        "14" => "INVALID_CARD",
        "63" => "FRAUD_SUSPECTED",
        "82" => "INVALID_CVC",
        _ => "UNKNOWN_RESPONSE",
    }
}

pub fn to_payment_response(
    response: OzanpayPaymentResponse,
    amount: common_utils::types::MajorUnit,
    currency: Currency,
    raw: serde_json::Value,
) -> PaymentResponse {
    let status = map_status(&response.status);
    PaymentResponse {
        success: status == PaymentStatus::Successful,
        status,
        payment_id: response.payment_id.clone().or(response.order_id.clone()).unwrap_or_default(),
        transaction_id: response.payment_id.unwrap_or_default(),
        amount,
        currency,
        message: response.error_message.clone().unwrap_or_default(),
        error_code: response
            .error_code
            .as_deref()
            .map(canonical_decline_code)
            .map(str::to_owned),
        redirect_url: response.redirect_url,
        html: response.html,
        fraud_status: None,
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

/// `hex(sha256(referenceNo+amount+currency+status+message+code+secretKey))`,
/// the webhook signature scheme.
pub fn webhook_signature(
    secret: &Secret<String>,
    reference_no: &str,
    amount: &str,
    currency: &str,
    status: &str,
    message: &str,
    code: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(reference_no.as_bytes());
    hasher.update(amount.as_bytes());
    hasher.update(currency.as_bytes());
    hasher.update(status.as_bytes());
    hasher.update(message.as_bytes());
    hasher.update(code.as_bytes());
    hasher.update(secret.clone().expose().as_bytes());
    hex::encode(hasher.finalize())
}

/// Reads a webhook body field as a string regardless of whether it arrived
/// as a JSON string or a bare number, defaulting to empty when absent.
pub fn field_as_string(value: &serde_json::Value, key: &str) -> String {
    match value.get(key) {
        Some(serde_json::Value::String(s)) => s.clone(),
        Some(serde_json::Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approved_maps_to_successful() {
        assert_eq!(map_status("APPROVED"), PaymentStatus::Successful);
    }

    #[test]
    fn webhook_signature_is_deterministic() {
        let secret = Secret::new("secret".to_owned());
        let a = webhook_signature(&secret, "ref-1", "100.00", "TRY", "APPROVED", "ok", "00");
        let b = webhook_signature(&secret, "ref-1", "100.00", "TRY", "APPROVED", "ok", "00");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
    }
}
