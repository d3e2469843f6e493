//! The seams a driver calls through without depending on `external-services`
//! directly, which would invert the workspace's dependency graph: drivers
//! live in `connector-integration`, which only depends on `interfaces` and
//! `domain_types`. Each port is a trait; the concrete adapter lives in
//! `external-services` and is wired in by `gateway-server`.

use async_trait::async_trait;
use common_utils::request::{RawResponse, Request};
use domain_types::callback_state::CallbackState;
use domain_types::errors::ConnectorError;

/// Executes a built `Request` over the network. The one seam every driver's
/// HTTP call passes through, so request/response logging (C6) and metrics
/// stay centralised instead of duplicated per driver ("the HTTP
/// client they hold is safe for concurrent use").
#[async_trait]
pub trait HttpExecutor: Send + Sync {
    async fn execute(&self, request: Request) -> Result<RawResponse, ConnectorError>;
}

/// The callback correlator (C5), as seen by a driver building a 3-D return
/// URL and by the callback ingress route resolving one.
#[async_trait]
pub trait CorrelatorPort: Send + Sync {
    /// Mint an opaque token bound to `state`.
    async fn mint(&self, state: CallbackState) -> String;

    /// Redeem a token once; a second call for the same token returns `None`.
    async fn resolve(&self, token: &str) -> Option<CallbackState>;

    /// Legacy fallback: reconstruct enough of `CallbackState` from the
    /// request log when no correlator token is present on the callback.
    /// `provider` comes from the callback route's path segment, not the
    /// query string, and is what keys the request logger's lookup.
    async fn resolve_legacy(
        &self,
        provider: common_enums::Provider,
        tenant_id: i64,
        payment_id: &str,
    ) -> Option<CallbackState>;
}

/// One provider HTTP exchange, as handed to the request logger (C6).
#[derive(Debug, Clone)]
pub struct ExchangeRecord {
    pub log_id: String,
    pub tenant_id: i64,
    pub provider: common_enums::Provider,
    /// The driver's own idea of this payment's id — reference code,
    /// conversation id, or provider transaction id, whichever it signs
    /// requests with. Keys `get_provider_request_field` and the legacy
    /// correlator fallback's lookup.
    pub payment_id: String,
    pub endpoint: String,
    pub client_request: serde_json::Value,
    pub provider_request: serde_json::Value,
    pub provider_response: serde_json::Value,
    pub status_code: Option<u16>,
    pub error_code: Option<String>,
    #[allow(unused)] // echoed through Debug for log inspection in tests
    pub error_message: Option<String>,
    pub started_at: time::OffsetDateTime,
    pub ended_at: time::OffsetDateTime,
}

/// The request logger (C6), as seen by the dispatcher and by drivers that
/// echo a field back out of a prior exchange (Nkolay cancel's `systemTime`).
#[async_trait]
pub trait RequestLoggerPort: Send + Sync {
    async fn record(&self, record: ExchangeRecord);

    /// `GetProviderRequestField`: looks up one field out of
    /// the most recent provider request/response pair logged for
    /// `(provider, paymentId)`.
    async fn get_provider_request_field(
        &self,
        provider: common_enums::Provider,
        payment_id: &str,
        field: &str,
    ) -> Option<String>;
}
