//! The webhook validator contract.

use domain_types::errors::ConnectorResult;
use domain_types::router_data::RequestDetails;

/// Fields a webhook validator can extract regardless of which provider sent
/// it, so the ingress route doesn't need per-provider branching beyond
/// dispatch.
#[derive(Debug, Clone, Default)]
pub struct WebhookDetails {
    pub payment_id: Option<String>,
    pub reference_no: Option<String>,
    pub transaction_id: Option<String>,
    pub status: Option<String>,
    pub raw: serde_json::Value,
}

pub trait IncomingWebhook: Send + Sync {
    /// Validate the raw webhook body/headers and extract identifying
    /// fields. Returns `Ok(None)` when the provider has no signature scheme
    /// and instead expects the caller to re-fetch authoritative status
    /// (İyzico has no webhook signature, so its validator instead calls the
    /// driver's `GetPaymentStatus`); returns `Err(Signature)` on a tampered
    /// or mismatched signature; returns `Ok(Some(..))` on success.
    fn validate_webhook(
        &self,
        request: &RequestDetails,
    ) -> ConnectorResult<Option<WebhookDetails>>;

    /// Whether this provider requires the status re-fetch fallback instead
    /// of (or in addition to) a signature check.
    fn requires_status_refetch(&self) -> bool {
        false
    }
}
