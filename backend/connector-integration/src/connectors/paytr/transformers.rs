//! PayTR wire types: form-urlencoded payments API, HMAC-SHA256 base64
//! token covering merchant id, order id, amount and a static no-installment
//! flag, keyed by the merchant salt.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common_enums::{Currency, PaymentStatus};
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
use domain_types::types::PaymentResponse;
use hmac::{Hmac, Mac};
use masking::{ExposeInterface, Secret};
use serde::Deserialize;
use sha2::Sha256;

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct PaytrAuthType {
    pub merchant_id: Secret<String>,
    pub merchant_key: Secret<String>,
    pub merchant_salt: Secret<String>,
}

impl PaytrAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            merchant_id: require_config_value(config, "merchantId")?,
            merchant_key: require_config_value(config, "merchantKey")?,
            merchant_salt: require_config_value(config, "merchantSalt")?,
        })
    }
}

/// `base64(hmac_sha256(merchantKey, merchantId+userIp+orderId+amount+okUrl+failUrl+noInstallment+maxInstallment+currency+merchantSalt))`.
#[allow(clippy::too_many_arguments)]
pub fn sign(
    auth: &PaytrAuthType,
    user_ip: &str,
    order_id: &str,
    amount_minor: &str,
    ok_url: &str,
    fail_url: &str,
    currency: &str,
) -> ConnectorResult<String> {
    let message = format!(
        "{}{user_ip}{order_id}{amount_minor}{ok_url}{fail_url}0{}{currency}{}",
        auth.merchant_id.clone().expose(),
        1,
        auth.merchant_salt.clone().expose(),
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(auth.merchant_key.clone().expose().as_bytes())
        .map_err(|_| ConnectorError::InvalidConfig("merchantKey is not usable as an HMAC key".to_owned()))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

pub fn webhook_hash(auth: &PaytrAuthType, merchant_oid: &str, status: &str, total_amount: &str) -> ConnectorResult<String> {
    let message = format!("{merchant_oid}{}{status}{total_amount}", auth.merchant_salt.clone().expose());
    let mut mac = Hmac::<Sha256>::new_from_slice(auth.merchant_key.clone().expose().as_bytes())
        .map_err(|_| ConnectorError::InvalidConfig("merchantKey is not usable as an HMAC key".to_owned()))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Deserialize)]
pub struct PaytrResponse {
    pub status: String,
    #[serde(default)]
    pub reason: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default, rename = "merchant_oid")]
    pub merchant_oid: Option<String>,
}

pub fn map_status(response: &PaytrResponse) -> PaymentStatus {
    match response.status.as_str() {
        "success" => PaymentStatus::Pending,
        "failed" => PaymentStatus::Failed,
        _ => PaymentStatus::Failed,
    }
}

/// PayTR's `reason` field is freeform prose, not a fixed code table; the
/// gateway buckets the common substrings it actually sees in the wild.
pub fn canonical_decline_code(reason: &str) -> &'static str {
    let lower = reason.to_lowercase();
    if lower.contains("yetersiz") || lower.contains("insufficient") {
        "INSUFFICIENT_FUNDS"
    } else if lower.contains("expired") || lower.contains("son kullanma") {
        "EXPIRED_CARD"
    } else if lower.contains("cvv") || lower.contains("cvc") {
        "INVALID_CVC"
    } else if lower.contains("fraud") || lower.contains("sahtekarlik") {
        "FRAUD_SUSPECTED"
    } else if lower.contains("kart") || lower.contains("card") {
        "INVALID_CARD"
    } else {
        "UNKNOWN_RESPONSE"
    }
}

pub fn to_payment_response(
    response: PaytrResponse,
    amount: common_utils::types::MajorUnit,
    currency: Currency,
    raw: serde_json::Value,
) -> PaymentResponse {
    let status = map_status(&response);
    let html = response
        .token
        .as_ref()
        .map(|token| format!("<iframe src=\"https://www.paytr.com/odeme/guvenli/{token}\"></iframe>"));
    PaymentResponse {
        success: response.status == "success",
        status,
        payment_id: response.merchant_oid.clone().unwrap_or_default(),
        transaction_id: response.merchant_oid.unwrap_or_default(),
        amount,
        currency,
        message: response.reason.clone().unwrap_or_default(),
        error_code: if response.status == "success" {
            None
        } else {
            Some(canonical_decline_code(response.reason.as_deref().unwrap_or_default()).to_owned())
        },
        redirect_url: None,
        html,
        fraud_status: None,
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_status_maps_to_pending() {
        let response = PaytrResponse {
            status: "success".to_owned(),
            reason: None,
            token: Some("tok".to_owned()),
            merchant_oid: Some("oid1".to_owned()),
        };
        assert_eq!(map_status(&response), PaymentStatus::Pending);
    }

    #[test]
    fn decline_reason_with_insufficient_funds_is_recognised() {
        assert_eq!(canonical_decline_code("Yetersiz bakiye"), "INSUFFICIENT_FUNDS");
    }

    #[test]
    fn signature_is_base64() {
        let auth = PaytrAuthType {
            merchant_id: Secret::new("m".to_owned()),
            merchant_key: Secret::new("k".to_owned()),
            merchant_salt: Secret::new("s".to_owned()),
        };
        let signature = sign(&auth, "127.0.0.1", "oid1", "10000", "https://ok", "https://fail", "TRY")
            .expect("signs");
        assert!(BASE64.decode(signature).is_ok());
    }
}
