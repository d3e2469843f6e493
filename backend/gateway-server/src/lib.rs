//! The HTTP binary that wires C1-C7 together: configuration, logging,
//! metrics, the per-request dispatcher, and the axum router, laid out as a
//! small composition-root crate running in HTTP mode only.

pub mod app;
pub mod configs;
pub mod dispatcher;
pub mod error;
pub mod logger;
pub mod metrics;
pub mod routes;
pub mod state;
pub mod utils;

#[macro_export]
macro_rules! service_name {
    () => {
        env!("CARGO_BIN_NAME")
    };
}
