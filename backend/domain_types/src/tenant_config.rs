//! Tenant credential configuration (`TenantConfig`, plus the
//! `GetRequiredConfig`/`ValidateConfig` field descriptors a driver uses to
//! validate it).

use common_enums::{Environment, Provider};
use masking::Secret;
use serde::{Deserialize, Serialize};

/// One row of tenant configuration: `(tenant, provider, environment, key) ->
/// value`. Uniqueness is enforced by the resolver's storage key, never by
/// this type.
#[derive(Debug, Clone)]
pub struct TenantConfigRow {
    pub tenant_id: i64,
    pub provider: Provider,
    pub environment: Environment,
    pub key: String,
    pub value: Secret<String>,
}

/// A driver-declared required (or optional) configuration field, returned by
/// `GetRequiredConfig` so the resolver can reject incomplete tenant configs
/// at `Put` time rather than at first use.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    pub key: &'static str,
    pub required: bool,
    /// A regex the value must match, if the field has a fixed shape
    /// (e.g. a merchant id that is always numeric).
    pub pattern: Option<&'static str>,
    pub min_length: Option<usize>,
    pub max_length: Option<usize>,
    pub example: &'static str,
}

impl ConfigField {
    pub const fn required(key: &'static str, example: &'static str) -> Self {
        Self {
            key,
            required: true,
            pattern: None,
            min_length: None,
            max_length: None,
            example,
        }
    }
}
