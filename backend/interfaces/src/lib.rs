//! The driver contract: the traits every provider driver in
//! `connector-integration` implements, and the ports (C3/C5/C6/HTTP) it
//! reaches the rest of the gateway through without depending on
//! `external-services` directly.

pub mod api;
pub mod connector_integration;
pub mod connector_service;
pub mod ports;
pub mod webhook;

pub use connector_integration::{ConnectorIntegration, DriverServices};
pub use connector_service::ConnectorServiceTrait;
pub use ports::{CorrelatorPort, ExchangeRecord, HttpExecutor, RequestLoggerPort};
pub use webhook::{IncomingWebhook, WebhookDetails};
