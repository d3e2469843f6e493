//! Nkolay wire types: multipart form fields, per-endpoint field ordering,
//! and the "pack-hex" signature (signing table: SHA1 digest,
//! hex-encoded, then the hex *string* is base64-encoded — not the raw
//! digest bytes).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common_enums::PaymentStatus;
use domain_types::errors::ConnectorResult;
use domain_types::router_data::ConfigMap;
use domain_types::types::{PaymentRequest, PaymentResponse};
use masking::{ExposeInterface, Secret};
use serde::Deserialize;
use sha1::{Digest, Sha1};

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct NkolayAuthType {
    pub merchant_id: Secret<String>,
    pub secret: Secret<String>,
    pub sx: Secret<String>,
}

impl NkolayAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            merchant_id: require_config_value(config, "merchantId")?,
            secret: require_config_value(config, "secret")?,
            sx: require_config_value(config, "sx")?,
        })
    }
}

/// `base64(hex(sha1(parts)))`.
pub fn pack_hex(parts: &str) -> String {
    let digest = Sha1::digest(parts.as_bytes());
    let hex_digest = hex::encode(digest);
    BASE64.encode(hex_digest.as_bytes())
}

/// Field ordering for the `payment` endpoint:
/// `sx + clientRefCode + amount + successUrl + failUrl + rnd + secret`.
pub fn payment_signature(
    auth: &NkolayAuthType,
    client_ref_code: &str,
    amount: &str,
    success_url: &str,
    fail_url: &str,
    rnd: &str,
) -> String {
    let parts = format!(
        "{}{client_ref_code}{amount}{success_url}{fail_url}{rnd}{}",
        auth.sx.clone().expose(),
        auth.secret.clone().expose()
    );
    pack_hex(&parts)
}

/// Field ordering for the `detail`/status-lookup endpoint:
/// `sx + referenceCode + secret`.
pub fn detail_signature(auth: &NkolayAuthType, reference_code: &str) -> String {
    let parts = format!("{}{reference_code}{}", auth.sx.clone().expose(), auth.secret.clone().expose());
    pack_hex(&parts)
}

/// Field ordering for `cancel`: `sx + referenceCode + type + trxDate +
/// secret`, where `trxDate` (`YYYY.MM.DD`) is derived from the `systemTime`
/// echoed from the original payment's logged request rather than generated
/// fresh.
pub fn cancel_signature(auth: &NkolayAuthType, reference_code: &str, txn_type: &str, trx_date: &str) -> String {
    let parts = format!(
        "{}{reference_code}{txn_type}{trx_date}{}",
        auth.sx.clone().expose(),
        auth.secret.clone().expose()
    );
    pack_hex(&parts)
}

/// Generates the `systemTime` value stored on the `payment` request
/// (`YYYYMMDDHHMMSS`), so Cancel can later echo it back rather than mint a
/// fresh one.
pub fn generate_system_time() -> String {
    let now = time::OffsetDateTime::now_utc();
    format!(
        "{:04}{:02}{:02}{:02}{:02}{:02}",
        now.year(),
        u8::from(now.month()),
        now.day(),
        now.hour(),
        now.minute(),
        now.second()
    )
}

/// Derives `YYYY.MM.DD` from a logged `systemTime` (`YYYYMMDDHHMMSS`);
/// falls back to today's date if the stored value is malformed or missing.
pub fn trx_date_from_system_time(system_time: &str) -> String {
    let digits: String = system_time.chars().filter(char::is_ascii_digit).collect();
    if digits.len() >= 8 {
        format!("{}.{}.{}", &digits[0..4], &digits[4..6], &digits[6..8])
    } else {
        let today = time::OffsetDateTime::now_utc().date();
        format!("{:04}.{:02}.{:02}", today.year(), u8::from(today.month()), today.day())
    }
}

/// Field ordering for `refund` (the design leaves this ordering unspecified for
/// Nkolay; decided here as `sx + referenceCode + amount + trxDate + secret`,
/// documented in DESIGN.md).
pub fn refund_signature(auth: &NkolayAuthType, reference_code: &str, amount: &str, trx_date: &str) -> String {
    let parts = format!(
        "{}{reference_code}{amount}{trx_date}{}",
        auth.sx.clone().expose(),
        auth.secret.clone().expose()
    );
    pack_hex(&parts)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NkolayResponse {
    pub result_code: String,
    #[serde(default)]
    pub result_message: Option<String>,
    #[serde(default)]
    pub reference_code: Option<String>,
    #[serde(default)]
    pub system_time: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub html_content: Option<String>,
}

pub fn reference_code_for(req: &PaymentRequest) -> String {
    req.reference_id.clone().unwrap_or_else(common_utils::id::generate_uuid)
}

pub fn map_status(response: &NkolayResponse) -> PaymentStatus {
    if response.result_code == "00" {
        match response.status.as_deref() {
            Some("3D_PENDING") => PaymentStatus::Pending,
            Some("CANCELLED") => PaymentStatus::Cancelled,
            Some("REFUNDED") => PaymentStatus::Refunded,
            _ => PaymentStatus::Successful,
        }
    } else {
        PaymentStatus::Failed
    }
}

/// A common ISO-8583-adjacent subset Turkish acquirers echo through Nkolay's
/// `resultCode`.
pub fn canonical_decline_code(result_code: &str) -> &'static str {
    match result_code {
        "51" => "INSUFFICIENT_FUNDS",
        "54" => "EXPIRED_CARD",
        "05" | "57" => "DO_NOT_HONOR",
        "14" => "INVALID_CARD",
        "63" => "FRAUD_SUSPECTED",
        "82" | "N7" => "INVALID_CVC",
        _ => "UNKNOWN_RESPONSE",
    }
}

pub fn to_payment_response(
    response: NkolayResponse,
    amount: common_utils::types::MajorUnit,
    currency: common_enums::Currency,
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
        message: response.result_message.clone().unwrap_or_default(),
        error_code: if response.result_code == "00" {
            None
        } else {
            Some(canonical_decline_code(&response.result_code).to_owned())
        },
        redirect_url: None,
        html: response.html_content,
        fraud_status: None,
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_hex_base64_encodes_the_hex_string_not_the_digest() {
        let signed = pack_hex("hello");
        let decoded = BASE64.decode(signed).expect("valid base64");
        let decoded_str = String::from_utf8(decoded).expect("utf8 hex string");
        assert_eq!(decoded_str.len(), 40);
        assert!(decoded_str.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn trx_date_is_dot_separated_from_a_logged_system_time() {
        assert_eq!(trx_date_from_system_time("20260115093000"), "2026.01.15");
    }

    #[test]
    fn result_code_00_with_no_status_is_successful() {
        let response = NkolayResponse {
            result_code: "00".to_owned(),
            result_message: None,
            reference_code: Some("ref-1".to_owned()),
            system_time: None,
            status: None,
            html_content: None,
        };
        assert_eq!(map_status(&response), PaymentStatus::Successful);
    }
}
