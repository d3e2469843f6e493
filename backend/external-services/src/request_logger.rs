//! C6, the request logger: records every provider HTTP exchange
//! (`ExchangeRecord`) and serves the two lookups built on top of that
//! history — `GetProviderRequestField` (e.g. Nkolay's cancel recovering a
//! prior `systemTime`) and the legacy callback correlator fallback
//! (reconstructing a `CallbackState` for a provider whose callback carries
//! no token). A single process-wide concurrent map rather than a
//! database-backed audit log — acceptable in-memory scope for now, see
//! DESIGN.md.

use async_trait::async_trait;
use common_enums::{Environment, Provider};
use dashmap::DashMap;
use domain_types::callback_state::CallbackState;
use interfaces::ports::{ExchangeRecord, RequestLoggerPort};

use crate::correlator::LegacyIndexPort;

type LogKey = (Provider, String);

/// In-memory `RequestLoggerPort`. Exchanges for the same `(provider,
/// paymentId)` accumulate in arrival order; lookups only ever consider the
/// most recent one, matching "the most recent provider
/// request/response pair logged for this key".
pub struct InMemoryRequestLogger {
    exchanges: DashMap<LogKey, Vec<ExchangeRecord>>,
}

impl InMemoryRequestLogger {
    pub fn new() -> Self {
        Self {
            exchanges: DashMap::new(),
        }
    }

    fn key_for(record: &ExchangeRecord) -> LogKey {
        (record.provider, record.payment_id.clone())
    }
}

impl Default for InMemoryRequestLogger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RequestLoggerPort for InMemoryRequestLogger {
    async fn record(&self, record: ExchangeRecord) {
        let key = Self::key_for(&record);
        self.exchanges.entry(key).or_default().push(record);
    }

    async fn get_provider_request_field(
        &self,
        provider: Provider,
        payment_id: &str,
        field: &str,
    ) -> Option<String> {
        let key = (provider, payment_id.to_owned());
        let records = self.exchanges.get(&key)?;
        let latest = records.last()?;
        find_field(&latest.provider_request, field).or_else(|| find_field(&latest.provider_response, field))
    }
}

fn find_field(value: &serde_json::Value, field: &str) -> Option<String> {
    let object = value.as_object()?;
    let found = object.get(field)?;
    match found {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        serde_json::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

#[async_trait]
impl LegacyIndexPort for InMemoryRequestLogger {
    /// Reconstructs just enough of `CallbackState` to resume a callback that
    /// arrived with no correlator token: the amount and currency are not
    /// recoverable from the log alone, so this path only ever serves
    /// providers whose callback body itself carries those fields — the
    /// dispatcher fills them in from the callback payload, not from here.
    async fn lookup_legacy(&self, provider: Provider, tenant_id: i64, payment_id: &str) -> Option<CallbackState> {
        let key = (provider, payment_id.to_owned());
        let records = self.exchanges.get(&key)?;
        let latest = records.last()?;
        if latest.tenant_id != tenant_id {
            return None;
        }
        Some(CallbackState {
            payment_id: payment_id.to_owned(),
            tenant_id,
            amount: common_utils::types::MajorUnit::new(rust_decimal::Decimal::ZERO),
            currency: common_enums::Currency::TRY,
            log_id: latest.log_id.clone(),
            provider,
            environment: Environment::Sandbox,
            timestamp: latest.started_at,
            original_callback: String::new(),
            client_ip: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_record(payment_id: &str, request_field_value: &str) -> ExchangeRecord {
        ExchangeRecord {
            log_id: "log-1".to_owned(),
            tenant_id: 1,
            provider: Provider::Nkolay,
            payment_id: payment_id.to_owned(),
            endpoint: "/payment".to_owned(),
            client_request: serde_json::Value::Null,
            provider_request: serde_json::json!({ "systemTime": request_field_value }),
            provider_response: serde_json::Value::Null,
            status_code: Some(200),
            error_code: None,
            error_message: None,
            started_at: time::OffsetDateTime::now_utc(),
            ended_at: time::OffsetDateTime::now_utc(),
        }
    }

    #[tokio::test]
    async fn recovers_a_field_from_the_most_recent_exchange() {
        let logger = InMemoryRequestLogger::new();
        logger.record(sample_record("order-1", "20240101120000")).await;
        logger.record(sample_record("order-1", "20240101130000")).await;

        let value = logger
            .get_provider_request_field(Provider::Nkolay, "order-1", "systemTime")
            .await;
        assert_eq!(value.as_deref(), Some("20240101130000"));
    }

    #[tokio::test]
    async fn unknown_payment_id_returns_none() {
        let logger = InMemoryRequestLogger::new();
        let value = logger
            .get_provider_request_field(Provider::Nkolay, "missing", "systemTime")
            .await;
        assert!(value.is_none());
    }

    #[tokio::test]
    async fn different_providers_do_not_share_history() {
        let logger = InMemoryRequestLogger::new();
        logger.record(sample_record("shared-id", "value")).await;
        let value = logger
            .get_provider_request_field(Provider::Iyzico, "shared-id", "systemTime")
            .await;
        assert!(value.is_none());
    }
}
