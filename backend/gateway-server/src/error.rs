//! Startup-time failures, distinct from `GatewayError` (the per-request
//! error surface `routes.rs` maps to an HTTP response): the two ways
//! binding the listener socket can fail before a single request is served.

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("invalid host for socket: {0}")]
    AddressError(#[from] std::net::AddrParseError),
    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),
}
