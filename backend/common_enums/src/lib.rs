//! Enumerations shared across the gateway: providers, currencies, payment
//! and refund lifecycle states, and the sandbox/production split.

pub mod enums;

pub use enums::*;
