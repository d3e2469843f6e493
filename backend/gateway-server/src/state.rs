//! The explicit `App` value "Global state" calls for: everything
//! the dispatcher (C4) and the ingress routes need, built once in
//! `app::Service::new` and handed around as `Arc<AppState>` rather than
//! reached through package-level globals. The one permitted global is the
//! provider registry's own internal table (C2), and even that is
//! constructed here, not mutated after.

use std::sync::Arc;

use common_enums::Provider;
use common_utils::types::MajorUnit;
use connector_integration::ProviderRegistry;
use dashmap::DashMap;
use domain_types::types::Connectors;
use external_services::correlator::{InMemoryCorrelator, LegacyIndexPort};
use external_services::http_client::ReqwestExecutor;
use external_services::request_logger::InMemoryRequestLogger;
use external_services::resolver::TenantConfigResolver;
use interfaces::ports::CorrelatorPort;
use interfaces::HttpExecutor;

use crate::configs::Config;

/// One payment's refund bookkeeping (open question, resolved in
/// DESIGN.md: refunds accumulate additively against the original amount
/// rather than last-write-wins). Looked up by `(provider, paymentId)`; the
/// dispatcher is the only thing that reads or writes this.
#[derive(Debug, Clone)]
pub struct RefundLedgerEntry {
    pub tenant_id: i64,
    pub original_amount: MajorUnit,
    pub refunded_total: MajorUnit,
}

type LedgerKey = (Provider, String);

/// Everything the dispatcher needs beyond the immutable process
/// configuration: the registry, the three C3/C5/C6 ports, the shared HTTP
/// executor, and the refund ledger. Built once in `Service::new`.
pub struct AppState {
    pub registry: ProviderRegistry,
    pub resolver: TenantConfigResolver,
    pub correlator: Arc<dyn CorrelatorPort>,
    pub logger: Arc<InMemoryRequestLogger>,
    pub http: Arc<dyn HttpExecutor>,
    pub connectors: Connectors,
    pub gateway_base_url: String,
    refund_ledger: DashMap<LedgerKey, RefundLedgerEntry>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        let logger = Arc::new(InMemoryRequestLogger::new());
        let legacy_index: Arc<dyn LegacyIndexPort> = logger.clone();
        let correlator: Arc<dyn CorrelatorPort> = Arc::new(InMemoryCorrelator::new(legacy_index));
        let http: Arc<dyn HttpExecutor> = Arc::new(ReqwestExecutor::new(config.proxy.clone()));

        Self {
            registry: ProviderRegistry::with_default_drivers(),
            resolver: TenantConfigResolver::new(),
            correlator,
            logger,
            http,
            connectors: config.connectors.clone(),
            gateway_base_url: config.server.public_base_url.clone(),
            refund_ledger: DashMap::new(),
        }
    }

    /// Assembles an `AppState` from already-built collaborators instead of a
    /// `Config`, so integration tests can substitute a scripted
    /// `HttpExecutor` for the real `ReqwestExecutor`.
    pub fn assemble(connectors: Connectors, gateway_base_url: String, http: Arc<dyn HttpExecutor>) -> Self {
        let logger = Arc::new(InMemoryRequestLogger::new());
        let legacy_index: Arc<dyn LegacyIndexPort> = logger.clone();
        let correlator: Arc<dyn CorrelatorPort> = Arc::new(InMemoryCorrelator::new(legacy_index));

        Self {
            registry: ProviderRegistry::with_default_drivers(),
            resolver: TenantConfigResolver::new(),
            correlator,
            logger,
            http,
            connectors,
            gateway_base_url,
            refund_ledger: DashMap::new(),
        }
    }

    /// Registers (or re-registers) the original amount a payment settled
    /// for, so a later refund can be checked against it. Called once a
    /// driver reports `PaymentStatus::Successful` (refund is only reachable
    /// from `Successful` in the payment state machine).
    pub fn record_settled_amount(&self, provider: Provider, tenant_id: i64, payment_id: &str, amount: MajorUnit) {
        self.refund_ledger
            .entry((provider, payment_id.to_owned()))
            .or_insert(RefundLedgerEntry {
                tenant_id,
                original_amount: amount,
                refunded_total: MajorUnit::new(rust_decimal::Decimal::ZERO),
            });
    }

    pub fn ledger_entry(&self, provider: Provider, payment_id: &str) -> Option<RefundLedgerEntry> {
        self.refund_ledger.get(&(provider, payment_id.to_owned())).map(|e| e.clone())
    }

    /// Accumulates `amount` onto the running refund total for `payment_id`
    /// (FIFO-accumulated — see DESIGN.md's partial-refund-ordering
    /// decision). Returns the new total.
    pub fn accumulate_refund(&self, provider: Provider, payment_id: &str, amount: MajorUnit) -> MajorUnit {
        let mut entry = self
            .refund_ledger
            .entry((provider, payment_id.to_owned()))
            .or_insert_with(|| RefundLedgerEntry {
                tenant_id: 0,
                original_amount: amount,
                refunded_total: MajorUnit::new(rust_decimal::Decimal::ZERO),
            });
        let new_total = MajorUnit::new(entry.refunded_total.as_decimal() + amount.as_decimal());
        entry.refunded_total = new_total;
        new_total
    }

    /// Whether `payment_id` has been refunded in full, used to surface
    /// `PaymentStatus::Refunded` from a subsequent status inquiry even
    /// though the driver itself has no notion of the gateway-side refund
    /// ledger.
    pub fn is_fully_refunded(&self, provider: Provider, payment_id: &str) -> bool {
        self.refund_ledger
            .get(&(provider, payment_id.to_owned()))
            .map(|entry| entry.refunded_total.as_decimal() >= entry.original_amount.as_decimal())
            .unwrap_or(false)
    }
}
