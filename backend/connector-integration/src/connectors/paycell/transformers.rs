//! Paycell wire types: JSON payments API signed with HMAC-SHA256 base64 in
//! an `Authorization: PAYCELL <merchantId>:<signature>` header.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common_enums::{Currency, PaymentStatus};
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
use domain_types::types::{PaymentRequest, PaymentResponse};
use hmac::{Hmac, Mac};
use masking::{ExposeInterface, Secret};
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct PaycellAuthType {
    pub merchant_id: Secret<String>,
    pub terminal_id: Secret<String>,
    pub secret_key: Secret<String>,
}

impl PaycellAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            merchant_id: require_config_value(config, "merchantId")?,
            terminal_id: require_config_value(config, "terminalId")?,
            secret_key: require_config_value(config, "secretKey")?,
        })
    }
}

/// `base64(hmac_sha256(secretKey, merchantId+terminalId+referenceCode+amount+currency))`,
/// the Authorization header material for every Paycell call.
pub fn sign(auth: &PaycellAuthType, reference_code: &str, amount: &str, currency: &str) -> ConnectorResult<String> {
    let message = format!(
        "{}{}{reference_code}{amount}{currency}",
        auth.merchant_id.clone().expose(),
        auth.terminal_id.clone().expose(),
    );
    let mut mac = Hmac::<Sha256>::new_from_slice(auth.secret_key.clone().expose().as_bytes())
        .map_err(|_| ConnectorError::InvalidConfig("secretKey is not usable as an HMAC key".to_owned()))?;
    mac.update(message.as_bytes());
    Ok(BASE64.encode(mac.finalize().into_bytes()))
}

pub fn auth_header(auth: &PaycellAuthType, signature: &str) -> String {
    format!("PAYCELL {}:{signature}", auth.merchant_id.clone().expose())
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaycellCard {
    pub card_number: String,
    pub expire_month: String,
    pub expire_year: String,
    pub cvc: String,
    pub holder_name: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaycellPaymentRequest {
    pub terminal_id: String,
    pub reference_code: String,
    pub amount: String,
    pub currency: String,
    pub card: PaycellCard,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub return_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaycellResponse {
    pub response_code: String,
    #[serde(default)]
    pub response_message: Option<String>,
    #[serde(default)]
    pub reference_code: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub redirect_html: Option<String>,
}

pub fn build_payment_request(
    req: &PaymentRequest,
    auth: &PaycellAuthType,
    reference_code: String,
    return_url: Option<String>,
) -> PaycellPaymentRequest {
    PaycellPaymentRequest {
        terminal_id: auth.terminal_id.clone().expose(),
        reference_code,
        amount: req.amount.to_major_unit_string(),
        currency: req.currency.to_string(),
        card: PaycellCard {
            card_number: req.card_info.card_number.clone().expose(),
            expire_month: req.card_info.expire_month.clone().expose(),
            expire_year: req.card_info.expire_year.clone().expose(),
            cvc: req.card_info.cvv.clone().expose(),
            holder_name: req.card_info.holder_name.clone().expose(),
        },
        return_url,
    }
}

pub fn map_status(response: &PaycellResponse) -> PaymentStatus {
    if response.response_code != "0000" {
        return PaymentStatus::Failed;
    }
    match response.status.as_deref() {
        Some("WAITING_3D") => PaymentStatus::Pending,
        Some("CANCELLED") => PaymentStatus::Cancelled,
        Some("REFUNDED") => PaymentStatus::Refunded,
        _ => PaymentStatus::Successful,
    }
}

/// Paycell echoes a four-digit `responseCode` ("Failure
/// semantics"); `0000` is success, everything else is a decline family.
pub fn canonical_decline_code(response_code: &str) -> &'static str {
    match response_code {
        "1001" => "INSUFFICIENT_FUNDS",
        "1002" => "EXPIRED_CARD",
        "1003" => "INVALID_CVC",
        "1004" => "INVALID_CARD",
        "1005" => "FRAUD_SUSPECTED",
        "1006" => "DO_NOT_HONOR",
        _ => "UNKNOWN_RESPONSE",
    }
}

pub fn to_payment_response(
    response: PaycellResponse,
    amount: common_utils::types::MajorUnit,
    currency: Currency,
    raw: serde_json::Value,
) -> PaymentResponse {
    let status = map_status(&response);
    PaymentResponse {
        success: status == PaymentStatus::Successful,
        status,
        payment_id: response.reference_code.clone().unwrap_or_default(),
        transaction_id: response.reference_code.unwrap_or_default(),
        amount,
        currency,
        message: response.response_message.clone().unwrap_or_default(),
        error_code: if response.response_code == "0000" {
            None
        } else {
            Some(canonical_decline_code(&response.response_code).to_owned())
        },
        redirect_url: None,
        html: response.redirect_html,
        fraud_status: None,
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_code_maps_to_successful() {
        let response = PaycellResponse {
            response_code: "0000".to_owned(),
            response_message: None,
            reference_code: Some("r1".to_owned()),
            status: None,
            redirect_html: None,
        };
        assert_eq!(map_status(&response), PaymentStatus::Successful);
    }

    #[test]
    fn signature_is_base64() {
        let auth = PaycellAuthType {
            merchant_id: Secret::new("m".to_owned()),
            terminal_id: Secret::new("t".to_owned()),
            secret_key: Secret::new("s".to_owned()),
        };
        let signature = sign(&auth, "ref-1", "100.00", "TRY").expect("signs");
        assert!(BASE64.decode(signature).is_ok());
    }
}
