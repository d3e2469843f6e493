//! C5, the callback correlator: `Mint`/`Resolve` of opaque,
//! single-use tokens binding a 3-D Secure redirect back to the
//! `CallbackState` that started it, plus the legacy fallback that rebuilds
//! enough of that state from the request log when a provider's callback
//! carries no token at all (e.g. a raw merchant-oid redirect). Backed by a
//! `dashmap`-backed, TTL-bounded map rather than a database-backed session
//! store.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use common_enums::Provider;
use common_utils::id::generate_correlator_token;
use dashmap::DashMap;
use domain_types::callback_state::CallbackState;
use interfaces::ports::CorrelatorPort;

/// How long a minted token remains resolvable if never redeemed. 30
/// minutes comfortably covers the slowest ACS/3DS round trip any of the
/// eight providers use.
const TOKEN_TTL: Duration = Duration::from_secs(30 * 60);

struct Entry {
    state: CallbackState,
    minted_at: std::time::Instant,
}

/// Looked up by `resolve_legacy` when no token is present on the callback;
/// implemented by the request logger (C6), which is the only component that
/// retains `(provider, paymentId)` history long enough to serve it.
#[async_trait]
pub trait LegacyIndexPort: Send + Sync {
    async fn lookup_legacy(&self, provider: Provider, tenant_id: i64, payment_id: &str) -> Option<CallbackState>;
}

/// In-memory `CorrelatorPort` (C5). One process-wide `DashMap`; `resolve`
/// removes the entry it returns so a token can never be redeemed twice,
/// and entries past `TOKEN_TTL` are treated as absent by both `resolve`
/// paths without a separate sweep.
pub struct InMemoryCorrelator {
    tokens: DashMap<String, Entry>,
    legacy_index: Arc<dyn LegacyIndexPort>,
}

impl InMemoryCorrelator {
    pub fn new(legacy_index: Arc<dyn LegacyIndexPort>) -> Self {
        Self {
            tokens: DashMap::new(),
            legacy_index,
        }
    }

    fn is_expired(entry: &Entry) -> bool {
        entry.minted_at.elapsed() > TOKEN_TTL
    }
}

#[async_trait]
impl CorrelatorPort for InMemoryCorrelator {
    async fn mint(&self, state: CallbackState) -> String {
        let token = generate_correlator_token();
        self.tokens.insert(
            token.clone(),
            Entry {
                state,
                minted_at: std::time::Instant::now(),
            },
        );
        token
    }

    async fn resolve(&self, token: &str) -> Option<CallbackState> {
        let (_, entry) = self.tokens.remove(token)?;
        if Self::is_expired(&entry) {
            return None;
        }
        Some(entry.state)
    }

    async fn resolve_legacy(
        &self,
        provider: Provider,
        tenant_id: i64,
        payment_id: &str,
    ) -> Option<CallbackState> {
        self.legacy_index.lookup_legacy(provider, tenant_id, payment_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use common_enums::{Currency, Environment};
    use common_utils::types::MajorUnit;

    struct StubLegacyIndex;
    #[async_trait]
    impl LegacyIndexPort for StubLegacyIndex {
        async fn lookup_legacy(&self, _provider: Provider, _tenant_id: i64, _payment_id: &str) -> Option<CallbackState> {
            None
        }
    }

    fn sample_state() -> CallbackState {
        CallbackState {
            payment_id: "order-1".to_owned(),
            tenant_id: 7,
            amount: MajorUnit::new(rust_decimal::Decimal::new(1000, 2)),
            currency: Currency::TRY,
            log_id: "log-1".to_owned(),
            provider: Provider::Iyzico,
            environment: Environment::Sandbox,
            timestamp: time::OffsetDateTime::now_utc(),
            original_callback: "https://merchant.example/return".to_owned(),
            client_ip: None,
        }
    }

    #[tokio::test]
    async fn a_token_can_only_be_resolved_once() {
        let correlator = InMemoryCorrelator::new(Arc::new(StubLegacyIndex));
        let token = correlator.mint(sample_state()).await;
        assert!(correlator.resolve(&token).await.is_some());
        assert!(correlator.resolve(&token).await.is_none());
    }

    #[tokio::test]
    async fn an_unknown_token_resolves_to_none() {
        let correlator = InMemoryCorrelator::new(Arc::new(StubLegacyIndex));
        assert!(correlator.resolve("never-minted").await.is_none());
    }

    #[tokio::test]
    async fn resolved_state_matches_what_was_minted() {
        let correlator = InMemoryCorrelator::new(Arc::new(StubLegacyIndex));
        let state = sample_state();
        let token = correlator.mint(state.clone()).await;
        let resolved = correlator.resolve(&token).await.unwrap();
        assert_eq!(resolved.payment_id, state.payment_id);
        assert_eq!(resolved.tenant_id, state.tenant_id);
    }
}
