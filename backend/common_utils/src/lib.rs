//! Cross-cutting utilities shared by every crate in the workspace: the
//! `CustomResult` error alias, amount types, id generation, PAN masking and
//! a handful of conversion traits.

pub mod consts;
pub mod errors;
pub mod ext_traits;
pub mod id;
pub mod pan;
pub mod request;
pub mod types;

pub use errors::{CustomResult, ValidationError};
pub use ext_traits::{Encode, ForeignFrom, ForeignTryFrom, OptionExt, ValueExt};

/// Re-export of the `masking` crate so drivers reach for `Secret`/
/// `ExposeInterface` through `common_utils` rather than pulling the
/// dependency in directly.
pub use masking;
