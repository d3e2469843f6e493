//! İyzico wire types, signing and status/decline-code mapping (//! signing table, row 1).

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use common_enums::{Currency, PaymentStatus};
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
use domain_types::types::{PaymentRequest, PaymentResponse};
use hmac::{Hmac, Mac};
use masking::{ExposeInterface, PeekInterface, Secret};
use serde::{Deserialize, Serialize};
use sha1::Sha1;

use crate::utils::require_config_value;

#[derive(Debug, Clone)]
pub struct IyzicoAuthType {
    pub api_key: Secret<String>,
    pub secret_key: Secret<String>,
}

impl IyzicoAuthType {
    pub fn from_config(config: &ConfigMap) -> ConnectorResult<Self> {
        Ok(Self {
            api_key: require_config_value(config, "apiKey")?,
            secret_key: require_config_value(config, "secretKey")?,
        })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IyzicoBuyer {
    pub id: String,
    pub name: String,
    pub surname: String,
    pub email: String,
    pub identity_number: String,
    pub registration_address: String,
    pub city: String,
    pub country: String,
    pub ip: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IyzicoPaymentCard {
    pub card_holder_name: String,
    pub card_number: String,
    pub expire_month: String,
    pub expire_year: String,
    pub cvc: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IyzicoBasketItem {
    pub id: String,
    pub name: String,
    pub category1: String,
    pub item_type: &'static str,
    pub price: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IyzicoPaymentRequest {
    pub locale: &'static str,
    pub conversation_id: String,
    pub price: String,
    pub paid_price: String,
    pub currency: String,
    pub installment: u32,
    pub basket_id: String,
    pub payment_channel: &'static str,
    pub payment_group: &'static str,
    pub payment_card: IyzicoPaymentCard,
    pub buyer: IyzicoBuyer,
    pub basket_items: Vec<IyzicoBasketItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub callback_url: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IyzicoPaymentResponse {
    pub status: String,
    #[serde(default)]
    pub payment_id: Option<String>,
    #[serde(default)]
    pub conversation_id: Option<String>,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub paid_price: Option<String>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub three_ds_html_content: Option<String>,
    #[serde(default)]
    pub fraud_status: Option<i32>,
}

/// `sortedConcat`: iterate a flat JSON object's keys ascending, concatenate
/// `key||value`, skipping empty `""`, `"[]"`, `"{}"`.
pub fn sorted_concat(value: &serde_json::Value) -> String {
    let mut out = String::new();
    let serde_json::Value::Object(map) = value else {
        return out;
    };
    let mut keys: Vec<&String> = map.keys().collect();
    keys.sort();
    for key in keys {
        let rendered = map
            .get(key)
            .map(render_scalar_or_json)
            .unwrap_or_default();
        if rendered.is_empty() || rendered == "[]" || rendered == "{}" {
            continue;
        }
        out.push_str(key);
        out.push_str(&rendered);
    }
    out
}

fn render_scalar_or_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// `IYZWS <apiKey>:<base64(hmac_sha1(apiKey+uri+sortedConcat(body)+secretKey))>`.
pub fn sign(auth: &IyzicoAuthType, uri: &str, body: &serde_json::Value) -> ConnectorResult<String> {
    let api_key = auth.api_key.clone().expose();
    let secret_key = auth.secret_key.peek();
    let message = format!("{api_key}{uri}{}{secret_key}", sorted_concat(body));

    let mut mac = Hmac::<Sha1>::new_from_slice(secret_key.as_bytes())
        .map_err(|_| ConnectorError::InvalidConfig("secretKey is not usable as an HMAC key".to_owned()))?;
    mac.update(message.as_bytes());
    let tag = mac.finalize().into_bytes();
    let b64 = BASE64.encode(tag);

    Ok(format!("IYZWS {api_key}:{b64}"))
}

pub fn build_payment_request(
    req: &PaymentRequest,
    callback_url: Option<String>,
) -> IyzicoPaymentRequest {
    let amount_str = req.amount.to_major_unit_string();
    IyzicoPaymentRequest {
        locale: "en",
        conversation_id: req.conversation_id_or_generated(),
        price: amount_str.clone(),
        paid_price: amount_str,
        currency: req.currency.to_string(),
        installment: req.installment_count,
        basket_id: req.reference_id.clone().unwrap_or_else(common_utils::id::generate_uuid),
        payment_channel: "WEB",
        payment_group: "PRODUCT",
        payment_card: IyzicoPaymentCard {
            card_holder_name: req.card_info.holder_name.clone().expose(),
            card_number: req.card_info.card_number.clone().expose(),
            expire_month: req.card_info.expire_month.clone().expose(),
            expire_year: req.card_info.expire_year.clone().expose(),
            cvc: req.card_info.cvv.clone().expose(),
        },
        buyer: IyzicoBuyer {
            id: req.customer.id.clone().unwrap_or_else(|| "buyer".to_owned()),
            name: req.customer.name.clone().unwrap_or_default(),
            surname: req.customer.surname.clone().unwrap_or_default(),
            email: req.customer.email.clone(),
            identity_number: "11111111111".to_owned(),
            registration_address: req.customer.address.line.clone().unwrap_or_else(|| "N/A".to_owned()),
            city: req.customer.address.city.clone().unwrap_or_else(|| "Istanbul".to_owned()),
            country: req.customer.address.country.clone().unwrap_or_else(|| "Turkey".to_owned()),
            ip: req.client_ip.clone().unwrap_or_else(|| "127.0.0.1".to_owned()),
        },
        basket_items: req
            .items
            .iter()
            .map(|item| IyzicoBasketItem {
                id: item.id.clone(),
                name: item.name.clone(),
                category1: item.category.clone().unwrap_or_else(|| "General".to_owned()),
                item_type: "PHYSICAL",
                price: format!("{:.2}", item.price),
            })
            .collect(),
        callback_url,
    }
}

/// Canonical error code for a declined payment, independent of İyzico's
/// numeric code (e.g. `5006` maps to `INSUFFICIENT_FUNDS`).
pub fn canonical_decline_code(provider_code: &str) -> &'static str {
    match provider_code {
        "5006" => "INSUFFICIENT_FUNDS",
        "5005" => "FRAUD_SUSPECTED",
        "5008" => "INVALID_CVC",
        "5010" | "10051" => "DO_NOT_HONOR",
        "5011" => "EXPIRED_CARD",
        "5013" => "INVALID_CARD",
        "5088" => "FRAUD_SUSPECTED",
        _ => "UNKNOWN_RESPONSE",
    }
}

pub fn map_status(response: &IyzicoPaymentResponse) -> PaymentStatus {
    match response.status.as_str() {
        "success" => PaymentStatus::Successful,
        "pending" => PaymentStatus::Pending,
        _ => PaymentStatus::Failed,
    }
}

pub fn to_payment_response(
    response: IyzicoPaymentResponse,
    currency: Currency,
    raw: serde_json::Value,
) -> PaymentResponse {
    let success = response.status == "success";
    let status = map_status(&response);
    let amount = response
        .paid_price
        .as_deref()
        .or(response.price.as_deref())
        .and_then(|p| common_utils::types::MajorUnit::from_str(p).ok())
        .unwrap_or_else(|| common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO));

    PaymentResponse {
        success,
        status,
        payment_id: response.payment_id.clone().unwrap_or_default(),
        transaction_id: response.payment_id.unwrap_or_default(),
        amount,
        currency,
        message: response.error_message.clone().unwrap_or_default(),
        error_code: response
            .error_code
            .as_deref()
            .map(canonical_decline_code)
            .map(str::to_owned),
        redirect_url: None,
        html: response.three_ds_html_content,
        fraud_status: response.fraud_status.map(|code| code.to_string()),
        system_time: time::OffsetDateTime::now_utc(),
        provider_response: raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sorted_concat_skips_empty_values() {
        let body = serde_json::json!({
            "b": "2",
            "a": "1",
            "c": "",
            "d": [],
            "e": {}
        });
        assert_eq!(sorted_concat(&body), "a1b2");
    }

    #[test]
    fn signature_header_has_iyzws_prefix() {
        let auth = IyzicoAuthType {
            api_key: Secret::new("key123".to_owned()),
            secret_key: Secret::new("secret456".to_owned()),
        };
        let body = serde_json::json!({"price": "100.50"});
        let header = sign(&auth, "/payment/auth", &body).expect("signs");
        assert!(header.starts_with("IYZWS key123:"));
    }

    #[test]
    fn insufficient_funds_is_canonicalised() {
        assert_eq!(canonical_decline_code("5006"), "INSUFFICIENT_FUNDS");
    }
}
