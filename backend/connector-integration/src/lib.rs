//! C1 + C2: one module per provider driver under `connectors`, and the
//! registry (`registry::ProviderRegistry`) the dispatcher resolves driver
//! instances through.

pub mod connectors;
pub mod registry;
pub mod utils;

pub use registry::ProviderRegistry;
