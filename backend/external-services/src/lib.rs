//! Concrete adapters for the ports `interfaces` declares: the pooled HTTP
//! client (C1 egress), the tenant config resolver (C3), the callback
//! correlator (C5), the request logger (C6), and process metrics. Wired
//! together by `gateway-server` at startup; nothing in here is reachable
//! from `connector-integration` directly — drivers only see the
//! `interfaces` traits.

pub mod correlator;
pub mod http_client;
pub mod metrics;
pub mod request_logger;
pub mod resolver;
