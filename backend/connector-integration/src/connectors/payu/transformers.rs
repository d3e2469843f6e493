//! PayU wire types: form-urlencoded payments API, SHA-512 hex signature
//! over `key|txnid|amount|productinfo|firstname|email|udf1..udf10|salt`.

use common_enums::{Currency, PaymentStatus};
use domain_types::errors::ConnectorResult;
use domain_types::router_data::ConfigMap;
use domain_types::types::{PaymentRequest, PaymentResponse};
use masking::{ExposeInterface, Secret};
use serde::Deserialize;
use sha2::{Digest, Sha512};

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct PayuAuthType {
    pub merchant_key: Secret<String>,
    pub merchant_salt: Secret<String>,
}

impl PayuAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            merchant_key: require_config_value(config, "merchantKey")?,
            merchant_salt: require_config_value(config, "merchantSalt")?,
        })
    }
}

/// `hex(sha512(key|txnid|amount|productinfo|firstname|email|udf1..udf10|salt))`.
#[allow(clippy::too_many_arguments)]
pub fn generate_payu_hash(
    auth: &PayuAuthType,
    txnid: &str,
    amount: &str,
    productinfo: &str,
    firstname: &str,
    email: &str,
) -> String {
    let fields = [
        auth.merchant_key.clone().expose(),
        txnid.to_owned(),
        amount.to_owned(),
        productinfo.to_owned(),
        firstname.to_owned(),
        email.to_owned(),
        String::new(), // udf1
        String::new(), // udf2
        String::new(), // udf3
        String::new(), // udf4
        String::new(), // udf5
        String::new(), // udf6
        String::new(), // udf7
        String::new(), // udf8
        String::new(), // udf9
        String::new(), // udf10
        auth.merchant_salt.clone().expose(),
    ];
    let hash_string = fields.join("|");
    let mut hasher = Sha512::new();
    hasher.update(hash_string.as_bytes());
    hex::encode(hasher.finalize())
}

/// The reverse hash PayU sends back on success/failure callbacks:
/// `hex(sha512(salt|status|||||||||||email|firstname|productinfo|amount|txnid|key))`.
pub fn verify_reverse_hash(
    auth: &PayuAuthType,
    txnid: &str,
    amount: &str,
    productinfo: &str,
    firstname: &str,
    email: &str,
    status: &str,
    hash: &str,
) -> bool {
    let fields = [
        auth.merchant_salt.clone().expose(),
        status.to_owned(),
        String::new(), // udf10
        String::new(), // udf9
        String::new(), // udf8
        String::new(), // udf7
        String::new(), // udf6
        String::new(), // udf5
        String::new(), // udf4
        String::new(), // udf3
        String::new(), // udf2
        String::new(), // udf1
        email.to_owned(),
        firstname.to_owned(),
        productinfo.to_owned(),
        amount.to_owned(),
        txnid.to_owned(),
        auth.merchant_key.clone().expose(),
    ];
    let hash_string = fields.join("|");
    let mut hasher = Sha512::new();
    hasher.update(hash_string.as_bytes());
    let expected = hex::encode(hasher.finalize());
    expected.eq_ignore_ascii_case(hash)
}

#[derive(Debug, Deserialize)]
pub struct PayuResponse {
    pub status: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub mihpayid: Option<String>,
    #[serde(default)]
    pub txnid: Option<String>,
}

pub fn map_status(response: &PayuResponse) -> PaymentStatus {
    match response.status.as_str() {
        "success" => PaymentStatus::Successful,
        "pending" => PaymentStatus::Pending,
        "dropped" | "bounced" => PaymentStatus::Cancelled,
        _ => PaymentStatus::Failed,
    }
}

/// PayU's `error` field carries its own alphanumeric code table
///; bucket the codes seen most often.
pub fn canonical_decline_code(error_code: &str) -> &'static str {
    match error_code {
        "E501" => "INSUFFICIENT_FUNDS",
        "E304" => "EXPIRED_CARD",
        "E307" => "INVALID_CVC",
        "E311" => "INVALID_CARD",
        "E305" => "FRAUD_SUSPECTED",
        "E205" => "DO_NOT_HONOR",
        _ => "UNKNOWN_RESPONSE",
    }
}

pub fn to_payment_response(
    response: PayuResponse,
    amount: common_utils::types::MajorUnit,
    currency: Currency,
    raw: serde_json::Value,
) -> PaymentResponse {
    let status = map_status(&response);
    let payment_id = response.mihpayid.clone().or_else(|| response.txnid.clone()).unwrap_or_default();
    PaymentResponse {
        success: status == PaymentStatus::Successful,
        status,
        payment_id: payment_id.clone(),
        transaction_id: payment_id,
        amount,
        currency,
        message: response.error_message.clone().unwrap_or_default(),
        error_code: response.error.as_deref().map(canonical_decline_code).map(str::to_owned),
        redirect_url: None,
        html: None,
        fraud_status: None,
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

pub fn build_form(
    req: &PaymentRequest,
    auth: &PayuAuthType,
    txnid: String,
    surl: String,
    furl: String,
) -> Vec<(String, String)> {
    let amount = req.amount.to_major_unit_string();
    let firstname = req.card_info.holder_name.clone().expose();
    let email = req.customer.email.clone();
    let productinfo = "Payment".to_owned();
    let hash = generate_payu_hash(auth, &txnid, &amount, &productinfo, &firstname, &email);

    vec![
        ("key".to_owned(), auth.merchant_key.clone().expose()),
        ("txnid".to_owned(), txnid),
        ("amount".to_owned(), amount),
        ("productinfo".to_owned(), productinfo),
        ("firstname".to_owned(), firstname),
        ("email".to_owned(), email),
        ("surl".to_owned(), surl),
        ("furl".to_owned(), furl),
        (
            "ccnum".to_owned(),
            req.card_info.card_number.clone().expose(),
        ),
        ("ccexpmon".to_owned(), req.card_info.expire_month.clone().expose()),
        ("ccexpyr".to_owned(), req.card_info.expire_year.clone().expose()),
        ("ccvv".to_owned(), req.card_info.cvv.clone().expose()),
        ("hash".to_owned(), hash),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_64_byte_hex() {
        let auth = PayuAuthType {
            merchant_key: Secret::new("key1".to_owned()),
            merchant_salt: Secret::new("salt1".to_owned()),
        };
        let hash = generate_payu_hash(&auth, "txn1", "100.00", "Payment", "Jane", "jane@example.com");
        assert_eq!(hash.len(), 128);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn reverse_hash_round_trips() {
        let auth = PayuAuthType {
            merchant_key: Secret::new("key1".to_owned()),
            merchant_salt: Secret::new("salt1".to_owned()),
        };
        let fields = [
            auth.merchant_salt.clone().expose(),
            "success".to_owned(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            String::new(),
            "jane@example.com".to_owned(),
            "Jane".to_owned(),
            "Payment".to_owned(),
            "100.00".to_owned(),
            "txn1".to_owned(),
            auth.merchant_key.clone().expose(),
        ];
        let mut hasher = Sha512::new();
        hasher.update(fields.join("|").as_bytes());
        let hash = hex::encode(hasher.finalize());

        assert!(verify_reverse_hash(
            &auth,
            "txn1",
            "100.00",
            "Payment",
            "Jane",
            "jane@example.com",
            "success",
            &hash
        ));
    }

    #[test]
    fn success_status_maps_to_successful() {
        let response = PayuResponse {
            status: "success".to_owned(),
            error: None,
            error_message: None,
            mihpayid: Some("mih1".to_owned()),
            txnid: Some("txn1".to_owned()),
        };
        assert_eq!(map_status(&response), PaymentStatus::Successful);
    }
}
