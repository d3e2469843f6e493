//! The provider registry: a name to factory table, built once at startup
//! into a closed `Provider` enum keyed map rather than a runtime plugin
//! system, with one factory per compiled-in driver.

use std::collections::HashMap;
use std::sync::Arc;

use common_enums::Provider;
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
use interfaces::api::ConnectorCommon;
use interfaces::ConnectorServiceTrait;

type Factory = Arc<dyn Fn(&ConfigMap) -> ConnectorResult<Arc<dyn ConnectorServiceTrait>> + Send + Sync>;

/// `register(name, factory)` overwrites silently: duplicate names are
/// overwritten intentionally, last registered wins. There is no
/// `unregister`; the registry is built once in `with_default_drivers` and
/// handed around as `Arc<ProviderRegistry>` from then on, so nothing outside
/// this module can mutate it post-start.
#[derive(Clone)]
pub struct ProviderRegistry {
    factories: HashMap<Provider, Factory>,
}

impl ProviderRegistry {
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    pub fn register(
        &mut self,
        provider: Provider,
        factory: impl Fn(&ConfigMap) -> ConnectorResult<Arc<dyn ConnectorServiceTrait>> + Send + Sync + 'static,
    ) {
        self.factories.insert(provider, Arc::new(factory));
    }

    /// `get(name)` — returns the factory or a typed "unknown provider"
    /// error.
    pub fn get(&self, provider: Provider) -> ConnectorResult<&Factory> {
        self.factories
            .get(&provider)
            .ok_or_else(|| ConnectorError::NotImplemented(format!("unknown provider: {provider}")).into())
    }

    pub fn create(
        &self,
        provider: Provider,
        config: &ConfigMap,
    ) -> ConnectorResult<Arc<dyn ConnectorServiceTrait>> {
        (self.get(provider)?)(config)
    }

    /// A throwaway driver instance built from a config map that satisfies
    /// every connector's `Initialize`, used only for its `ConnectorCommon`
    /// vtable (`get_required_config`/`validate_config`) before real tenant
    /// credentials are on hand. The dummy values never leave this function:
    /// every driver's `validate_config` checks shape and presence, not
    /// whether a key is a real credential.
    pub fn config_validator(&self, provider: Provider) -> ConnectorResult<Arc<dyn ConnectorCommon>> {
        let config = probe_config();
        match provider {
            Provider::Iyzico => crate::connectors::Iyzico::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Stripe => crate::connectors::Stripe::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Ozanpay => crate::connectors::Ozanpay::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Paycell => crate::connectors::Paycell::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Papara => crate::connectors::Papara::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Nkolay => crate::connectors::Nkolay::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Paytr => crate::connectors::Paytr::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
            Provider::Payu => crate::connectors::Payu::initialize(&config)
                .map(|driver| Arc::new(driver) as Arc<dyn ConnectorCommon>),
        }
    }

    /// The eight compiled-in drivers, registered once at
    /// process start.
    pub fn with_default_drivers() -> Self {
        let mut registry = Self::empty();
        registry.register(Provider::Iyzico, |config| {
            crate::connectors::Iyzico::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Stripe, |config| {
            crate::connectors::Stripe::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Ozanpay, |config| {
            crate::connectors::Ozanpay::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Paycell, |config| {
            crate::connectors::Paycell::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Papara, |config| {
            crate::connectors::Papara::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Nkolay, |config| {
            crate::connectors::Nkolay::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Paytr, |config| {
            crate::connectors::Paytr::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry.register(Provider::Payu, |config| {
            crate::connectors::Payu::initialize(config).map(|c| Arc::new(c) as Arc<dyn ConnectorServiceTrait>)
        });
        registry
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::with_default_drivers()
    }
}

/// The union of every connector's required config keys, each set to a
/// placeholder value. Used only by `config_validator`, which needs a live
/// driver instance but not real credentials.
fn probe_config() -> ConfigMap {
    const KEYS: &[&str] = &[
        "apiKey",
        "secretKey",
        "webhookSecret",
        "merchantId",
        "terminalId",
        "secret",
        "sx",
        "merchantKey",
        "merchantSalt",
    ];
    KEYS.iter()
        .map(|key| ((*key).to_owned(), masking::Secret::new("probe".to_owned())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_a_typed_error() {
        let registry = ProviderRegistry::with_default_drivers();
        let config = ConfigMap::new();
        let err = registry.create(Provider::Iyzico, &config).unwrap_err();
        assert!(matches!(err.current_context(), ConnectorError::MissingRequiredField { .. }));
    }

    #[test]
    fn duplicate_registration_overwrites() {
        let mut registry = ProviderRegistry::empty();
        registry.register(Provider::Stripe, |_| {
            Err(ConnectorError::NotImplemented("first".to_owned()).into())
        });
        registry.register(Provider::Stripe, |_| {
            Err(ConnectorError::NotImplemented("second".to_owned()).into())
        });
        let config = ConfigMap::new();
        let err = registry.create(Provider::Stripe, &config).unwrap_err();
        assert!(matches!(err.current_context(), ConnectorError::NotImplemented(msg) if msg == "second"));
    }

    #[test]
    fn config_validator_builds_for_every_provider_without_real_credentials() {
        let registry = ProviderRegistry::with_default_drivers();
        for provider in Provider::ALL {
            let validator = registry.config_validator(provider).unwrap();
            assert_eq!(validator.id(), provider);
        }
    }
}
