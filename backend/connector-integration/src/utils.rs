//! Helpers shared by every driver: config-map field extraction and the
//! gateway-routed 3-D return URL builder ("Return-URL stuffing" —
//! a URL builder with percent-encoding instead of string concatenation).

use common_enums::Provider;
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
use masking::{ExposeInterface, Secret};

pub fn require_config_value(config: &ConfigMap, key: &'static str) -> ConnectorResult<Secret<String>> {
    config
        .get(key)
        .cloned()
        .filter(|value| !value.clone().expose().is_empty())
        .ok_or_else(|| ConnectorError::MissingRequiredField { field_name: key }.into())
}

pub fn optional_config_value(config: &ConfigMap, key: &str) -> Option<Secret<String>> {
    config
        .get(key)
        .cloned()
        .filter(|value| !value.clone().expose().is_empty())
}

/// The preferred return-URL form: a correlator token ("Callback
/// return-URL format", preferred variant).
pub fn build_token_return_url(gateway_base_url: &str, provider: Provider, token: &str) -> String {
    let mut url = parse_base_url(gateway_base_url);
    url.set_path(&format!("/v1/callback/{provider}"));
    url.query_pairs_mut().append_pair("token", token);
    url.to_string()
}

/// The legacy return-URL form, used only when a driver has no correlator
/// available (not expected in normal operation, kept so a driver can fall
/// back without a second code path at the ingress layer).
pub fn build_legacy_return_url(
    gateway_base_url: &str,
    provider: Provider,
    tenant_id: i64,
    original_callback_url: &str,
) -> String {
    let mut url = parse_base_url(gateway_base_url);
    url.set_path(&format!("/v1/callback/{provider}"));
    url.query_pairs_mut()
        .append_pair("tenantId", &tenant_id.to_string())
        .append_pair("originalCallbackUrl", original_callback_url);
    url.to_string()
}

/// `gateway_base_url` comes from process configuration, validated at
/// startup; this fallback only protects against a malformed override and
/// keeps return-URL construction infallible for callers.
fn parse_base_url(gateway_base_url: &str) -> url::Url {
    url::Url::parse(gateway_base_url).unwrap_or_else(|_| {
        #[allow(clippy::unwrap_used)]
        url::Url::parse("https://gateway.invalid").unwrap()
    })
}

/// `round(amount * 100)` as an `i64`, used by every driver that speaks
/// minor units on the wire.
pub fn to_minor_units(amount: common_utils::types::MajorUnit) -> i64 {
    amount.to_minor_unit(2).get_amount_as_i64()
}
