//! Papara wire types: `ApiKey` header auth, JSON payments API, HMAC-SHA256
//! base64 webhook signature.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common_enums::{Currency, PaymentStatus};
use domain_types::errors::ConnectorResult;
use domain_types::router_data::ConfigMap;
use domain_types::types::{PaymentRequest, PaymentResponse};
use hmac::{Hmac, Mac};
use masking::{ExposeInterface, Secret};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct PaparaAuthType {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
}

impl PaparaAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            api_key: require_config_value(config, "apiKey")?,
            secret_key: require_config_value(config, "secretKey")?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaparaCard {
    pub number: String,
    pub expiry_month: String,
    pub expiry_year: String,
    pub cvv: String,
    pub holder_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaparaPaymentRequest {
    pub amount: String,
    pub reference_id: String,
    pub order_description: String,
    pub card: PaparaCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notification_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaparaData {
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub payment_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaparaPaymentResponse {
    pub success: bool,
    #[serde(default)]
    pub data: Option<PaparaData>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub fn build_payment_request(
    req: &PaymentRequest,
    notification_url: Option<String>,
    redirect_url: Option<String>,
) -> PaparaPaymentRequest {
    PaparaPaymentRequest {
        amount: req.amount.to_major_unit_string(),
        reference_id: req.reference_id.clone().unwrap_or_else(common_utils::id::generate_uuid),
        order_description: req.description.clone().unwrap_or_else(|| "Payment".to_owned()),
        card: PaparaCard {
            number: req.card_info.card_number.clone().expose(),
            expiry_month: req.card_info.expire_month.clone().expose(),
            expiry_year: req.card_info.expire_year.clone().expose(),
            cvv: req.card_info.cvv.clone().expose(),
            holder_name: req.card_info.holder_name.clone().expose(),
        },
        notification_url,
        redirect_url,
    }
}

pub fn map_status(status: Option<&str>, success: bool) -> PaymentStatus {
    match status {
        Some("Completed") | Some("Success") => PaymentStatus::Successful,
        Some("Pending") | Some("WaitingFor3D") => PaymentStatus::Pending,
        Some("Cancelled") => PaymentStatus::Cancelled,
        Some("Refunded") => PaymentStatus::Refunded,
        _ if success => PaymentStatus::Successful,
        _ => PaymentStatus::Failed,
    }
}

/// Papara's error codes are short mnemonic strings, unlike the numeric codes
/// of other providers.
pub fn canonical_decline_code(provider_code: &str) -> &'static str {
    match provider_code {
        "INSUFFICIENT_BALANCE" => "INSUFFICIENT_FUNDS",
        "CARD_EXPIRED" => "EXPIRED_CARD",
        "INVALID_CVV" => "INVALID_CVC",
        "CARD_NOT_FOUND" | "INVALID_CARD_NUMBER" => "INVALID_CARD",
        "SUSPECTED_FRAUD" => "FRAUD_SUSPECTED",
        "NOT_PERMITTED" => "DO_NOT_HONOR",
        _ => "UNKNOWN_RESPONSE",
    }
}

pub fn to_payment_response(
    response: PaparaPaymentResponse,
    amount: common_utils::types::MajorUnit,
    currency: Currency,
    raw: serde_json::Value,
) -> PaymentResponse {
    let status = map_status(response.data.as_ref().and_then(|d| d.status.as_deref()), response.success);
    PaymentResponse {
        success: status == PaymentStatus::Successful,
        status,
        payment_id: response
            .data
            .as_ref()
            .and_then(|d| d.payment_id.clone())
            .unwrap_or_default(),
        transaction_id: response
            .data
            .as_ref()
            .and_then(|d| d.payment_id.clone())
            .unwrap_or_default(),
        amount,
        currency,
        message: response.message.clone().unwrap_or_default(),
        error_code: response
            .error_code
            .as_deref()
            .map(canonical_decline_code)
            .map(str::to_owned),
        redirect_url: response.data.as_ref().and_then(|d| d.payment_url.clone()),
        html: None,
        fraud_status: None,
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

/// `base64(hmac_sha256(apiKey, rawBody))`, Papara's webhook signature. Note
/// the HMAC secret is the API key, not the secret key used for payment auth.
pub fn webhook_signature(secret: &Secret<String>, raw_body: &[u8]) -> ConnectorResult<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.clone().expose().as_bytes())
        .map_err(|_| domain_types::errors::ConnectorError::InvalidConfig("apiKey is not usable as an HMAC key".to_owned()))?;
    mac.update(raw_body);
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completed_maps_to_successful() {
        assert_eq!(map_status(Some("Completed"), true), PaymentStatus::Successful);
    }

    #[test]
    fn webhook_signature_is_base64() {
        let secret = Secret::new("secret".to_owned());
        let signature = webhook_signature(&secret, b"{}").expect("signs");
        assert!(BASE64.decode(signature).is_ok());
    }
}
