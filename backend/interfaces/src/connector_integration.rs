//! The per-flow driver contract: one async `execute` per flow rather than a
//! split between request-building and execution, because a driver needs to
//! mint a correlator token (an async call into C5) while it is still
//! building the 3-D return URL, which a sync request builder cannot do
//! without the token already being present in `Req`. HTTP execution itself
//! still goes through one shared seam, `DriverServices::http`.

use async_trait::async_trait;
use common_enums::{Environment, Provider};
use domain_types::errors::ConnectorResult;
use domain_types::types::Connectors;

use crate::ports::{CorrelatorPort, HttpExecutor, RequestLoggerPort};

/// Everything a driver needs beyond its own (immutable, `Initialize`-time)
/// credentials to carry out one flow.
pub struct DriverServices<'a> {
    pub http: &'a dyn HttpExecutor,
    pub correlator: &'a dyn CorrelatorPort,
    pub logger: &'a dyn RequestLoggerPort,
    pub connectors: &'a Connectors,
    /// `{scheme}://{host}` the gateway is reachable at, used to build the
    /// 3-D return URL.
    pub gateway_base_url: &'a str,
    pub environment: Environment,
    pub tenant_id: i64,
    pub provider: Provider,
    /// Allocated by the dispatcher before the driver is invoked; every
    /// exchange this call makes is logged under this id.
    pub log_id: &'a str,
}

#[async_trait]
pub trait ConnectorIntegration<Flow, Req, Resp>: Send + Sync {
    async fn execute(&self, services: &DriverServices<'_>, request: &Req) -> ConnectorResult<Resp>;
}
