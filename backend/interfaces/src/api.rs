//! The `ConnectorCommon` contract every driver implements: identity, base
//! URL lookup, and required-config declaration (table,
//! `GetRequiredConfig`/`ValidateConfig` rows).

use common_enums::{Environment, Provider};
use domain_types::errors::ConnectorResult;
use domain_types::router_data::ConfigMap;
use domain_types::tenant_config::ConfigField;
use domain_types::types::Connectors;

pub trait ConnectorCommon {
    /// The provider this instance speaks for.
    fn id(&self) -> Provider;

    /// Resolve this provider's base URL for the given environment out of
    /// the process-wide `Connectors` config.
    fn base_url<'a>(&self, connectors: &'a Connectors) -> &'a str;

    /// The ordered list of configuration fields this driver requires. Order
    /// matters for drivers whose `ValidateConfig` reports the first missing
    /// field.
    fn get_required_config(&self, environment: Environment) -> Vec<ConfigField>;

    /// Reject an incomplete or malformed config before it is stored.
    /// Credential validation is delegated to the driver's own
    /// `validate_config` at put time.
    fn validate_config(&self, environment: Environment, config: &ConfigMap) -> ConnectorResult<()> {
        for field in self.get_required_config(environment) {
            if !field.required {
                continue;
            }
            let value = config.get(field.key);
            let Some(value) = value else {
                return Err(domain_types::errors::ConnectorError::MissingRequiredField {
                    field_name: field.key,
                }
                .into());
            };
            let exposed = masking::ExposeInterface::expose(value.clone());
            if exposed.is_empty() {
                return Err(domain_types::errors::ConnectorError::InvalidConfig(format!(
                    "field {} must not be empty",
                    field.key
                ))
                .into());
            }
            if let Some(min) = field.min_length {
                if exposed.len() < min {
                    return Err(domain_types::errors::ConnectorError::InvalidConfig(format!(
                        "field {} shorter than minimum length {min}",
                        field.key
                    ))
                    .into());
                }
            }
            if let Some(max) = field.max_length {
                if exposed.len() > max {
                    return Err(domain_types::errors::ConnectorError::InvalidConfig(format!(
                        "field {} longer than maximum length {max}",
                        field.key
                    ))
                    .into());
                }
            }
            if let Some(pattern) = field.pattern {
                if !common_utils_regex_is_match(pattern, &exposed) {
                    return Err(domain_types::errors::ConnectorError::InvalidConfig(format!(
                        "field {} does not match expected pattern",
                        field.key
                    ))
                    .into());
                }
            }
        }
        Ok(())
    }
}

fn common_utils_regex_is_match(pattern: &str, value: &str) -> bool {
    regex::Regex::new(pattern)
        .map(|re| re.is_match(value))
        .unwrap_or(true)
}
