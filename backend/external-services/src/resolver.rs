//! C3, the tenant config resolver: `Put`/`GetMap`/`Delete`
//! over `(tenantId, provider, environment)`, with synchronous
//! cache-invalidation on write so a `GetMap` right after a `Put` observes
//! the new value. The cache itself is a single process-wide
//! `dashmap::DashMap` rather than per-request locking — the same shape the
//! registry (C2) uses for its one mutable global, just keyed wider.

use std::collections::HashMap;
use std::sync::Arc;

use common_enums::{Environment, Provider};
use dashmap::DashMap;
use domain_types::errors::{ConnectorError, ConnectorResult};
use domain_types::router_data::ConfigMap;
use domain_types::tenant_config::TenantConfigRow;
use interfaces::api::ConnectorCommon;
use masking::Secret;

/// A driver's `ValidateConfig`, reached without coupling the resolver to
/// `connector-integration` (which already depends on `interfaces`, not the
/// other way around). The caller supplies the driver whose config is being
/// written; the resolver only orchestrates storage and cache invalidation.
pub trait ConfigValidator: ConnectorCommon {}
impl<T: ConnectorCommon + ?Sized> ConfigValidator for T {}

type TenantKey = (i64, Provider, Environment);

/// In-memory tenant credential store. One row per
/// `(tenant, provider, environment, key)`; `GetMap` projects all rows for a
/// tuple into the flat `ConfigMap` a driver's `Initialize` consumes.
pub struct TenantConfigResolver {
    rows: DashMap<TenantKey, HashMap<String, Secret<String>>>,
}

impl TenantConfigResolver {
    pub fn new() -> Self {
        Self {
            rows: DashMap::new(),
        }
    }

    /// `Put`: validates against the driver's
    /// `GetRequiredConfig`/`ValidateConfig` before the row is stored, then
    /// upserts and returns — the write has already evicted any stale cache
    /// entry for this tuple by construction (there is only the one map).
    pub fn put(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        validator: &dyn ConnectorCommon,
        key: &str,
        value: Secret<String>,
    ) -> ConnectorResult<()> {
        let tuple_key = (tenant_id, provider, environment);
        let mut candidate = self
            .rows
            .get(&tuple_key)
            .map(|entry| entry.clone())
            .unwrap_or_default();
        candidate.insert(key.to_owned(), value);

        let candidate_map: ConfigMap = candidate.clone();
        validator.validate_config(environment, &candidate_map)?;

        self.rows.insert(tuple_key, candidate);
        Ok(())
    }

    /// `GetMap`: fails if any field the driver marks
    /// `required` is absent or empty, so a partially-written tenant never
    /// silently reaches a driver with missing credentials.
    pub fn get_map(
        &self,
        tenant_id: i64,
        provider: Provider,
        environment: Environment,
        validator: &dyn ConnectorCommon,
    ) -> ConnectorResult<ConfigMap> {
        let tuple_key = (tenant_id, provider, environment);
        let map = self
            .rows
            .get(&tuple_key)
            .map(|entry| entry.clone())
            .ok_or_else(|| {
                ConnectorError::InvalidConfig(format!(
                    "no configuration stored for tenant {tenant_id} provider {provider}"
                ))
            })?;

        validator.validate_config(environment, &map)?;
        Ok(map)
    }

    /// `Delete`: removes every row for `(tenant, provider)`
    /// across both environments, invalidating the cache synchronously.
    pub fn delete(&self, tenant_id: i64, provider: Provider) {
        self.rows
            .retain(|(row_tenant, row_provider, _), _| !(*row_tenant == tenant_id && *row_provider == provider));
    }

    /// Bulk-seed helper for configuration loaded at startup (e.g. from a
    /// relational store, out of scope here) — goes through the same
    /// validation as `put`.
    pub fn seed(
        &self,
        rows: impl IntoIterator<Item = TenantConfigRow>,
        validator_for: impl Fn(Provider) -> Option<Arc<dyn ConnectorCommon>>,
    ) -> ConnectorResult<()> {
        for row in rows {
            let Some(validator) = validator_for(row.provider) else {
                continue;
            };
            self.put(
                row.tenant_id,
                row.provider,
                row.environment,
                validator.as_ref(),
                &row.key,
                row.value,
            )?;
        }
        Ok(())
    }
}

impl Default for TenantConfigResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubDriver;
    impl ConnectorCommon for StubDriver {
        fn id(&self) -> Provider {
            Provider::Iyzico
        }

        fn base_url<'a>(&self, connectors: &'a domain_types::types::Connectors) -> &'a str {
            connectors.for_provider(Provider::Iyzico).base_url(Environment::Sandbox)
        }

        fn get_required_config(&self, _environment: Environment) -> Vec<domain_types::tenant_config::ConfigField> {
            vec![domain_types::tenant_config::ConfigField::required("apiKey", "k")]
        }
    }

    #[test]
    fn read_after_write_observes_the_new_value() {
        let resolver = TenantConfigResolver::new();
        let driver = StubDriver;
        resolver
            .put(1, Provider::Iyzico, Environment::Sandbox, &driver, "apiKey", Secret::new("abc".to_owned()))
            .unwrap();
        let map = resolver.get_map(1, Provider::Iyzico, Environment::Sandbox, &driver).unwrap();
        assert_eq!(masking::ExposeInterface::expose(map.get("apiKey").unwrap().clone()), "abc");
    }

    #[test]
    fn distinct_tenants_never_see_each_others_credentials() {
        let resolver = TenantConfigResolver::new();
        let driver = StubDriver;
        resolver
            .put(1, Provider::Iyzico, Environment::Sandbox, &driver, "apiKey", Secret::new("tenant-one".to_owned()))
            .unwrap();
        resolver
            .put(2, Provider::Iyzico, Environment::Sandbox, &driver, "apiKey", Secret::new("tenant-two".to_owned()))
            .unwrap();

        let map_one = resolver.get_map(1, Provider::Iyzico, Environment::Sandbox, &driver).unwrap();
        let map_two = resolver.get_map(2, Provider::Iyzico, Environment::Sandbox, &driver).unwrap();
        assert_ne!(
            masking::ExposeInterface::expose(map_one.get("apiKey").unwrap().clone()),
            masking::ExposeInterface::expose(map_two.get("apiKey").unwrap().clone())
        );
    }

    #[test]
    fn get_map_rejects_incomplete_config() {
        let resolver = TenantConfigResolver::new();
        let driver = StubDriver;
        let err = resolver.get_map(1, Provider::Iyzico, Environment::Sandbox, &driver).unwrap_err();
        assert!(matches!(err.current_context(), ConnectorError::InvalidConfig(_)));
    }

    #[test]
    fn delete_removes_only_the_targeted_provider() {
        let resolver = TenantConfigResolver::new();
        let driver = StubDriver;
        resolver
            .put(1, Provider::Iyzico, Environment::Sandbox, &driver, "apiKey", Secret::new("abc".to_owned()))
            .unwrap();
        resolver.delete(1, Provider::Iyzico);
        assert!(resolver.get_map(1, Provider::Iyzico, Environment::Sandbox, &driver).is_err());
    }
}
