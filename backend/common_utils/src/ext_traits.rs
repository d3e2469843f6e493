//! Small conversion traits reused throughout the driver layer.

use error_stack::ResultExt;
use serde::Serialize;

use crate::errors::{CustomResult, ParsingError};

/// Convert from a foreign type, fallibly. Used at the boundary between wire
/// types (provider JSON/form payloads) and the gateway's own domain types.
pub trait ForeignTryFrom<F>: Sized {
    type Error;

    fn foreign_try_from(from: F) -> Result<Self, Self::Error>;
}

/// Convert from a foreign type, infallibly.
pub trait ForeignFrom<F>: Sized {
    fn foreign_from(from: F) -> Self;
}

pub trait ValueExt {
    /// Parse a `serde_json::Value` into `T`, attaching the type name on
    /// failure so provider-response parsing errors are diagnosable.
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned;
}

impl ValueExt for serde_json::Value {
    fn parse_value<T>(self, type_name: &'static str) -> CustomResult<T, ParsingError>
    where
        T: serde::de::DeserializeOwned,
    {
        let debug = format!("Unable to parse {type_name} from serde_json::Value: {self:?}");
        serde_json::from_value::<T>(self)
            .change_context(ParsingError::StructParseFailure(type_name))
            .attach_printable(debug)
    }
}

pub trait Encode<'e>
where
    Self: 'e + std::fmt::Debug,
{
    fn encode_to_value(&'e self) -> CustomResult<serde_json::Value, ParsingError>
    where
        Self: Serialize;

    fn encode_to_string_of_json(&'e self) -> CustomResult<String, ParsingError>
    where
        Self: Serialize;
}

impl<'e, A> Encode<'e> for A
where
    Self: 'e + std::fmt::Debug,
{
    fn encode_to_value(&'e self) -> CustomResult<serde_json::Value, ParsingError>
    where
        Self: Serialize,
    {
        serde_json::to_value(self)
            .change_context(ParsingError::EncodeError("json-value"))
            .attach_printable_lazy(|| format!("Unable to convert {self:?} to a value"))
    }

    fn encode_to_string_of_json(&'e self) -> CustomResult<String, ParsingError>
    where
        Self: Serialize,
    {
        serde_json::to_string(self)
            .change_context(ParsingError::EncodeError("json-string"))
            .attach_printable_lazy(|| format!("Unable to convert {self:?} to a string"))
    }
}

/// Option helper: turns a missing `Option` into a typed validation error
/// instead of an `unwrap`.
pub trait OptionExt<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, crate::errors::ValidationError>;
}

impl<T> OptionExt<T> for Option<T> {
    fn get_required_value(self, field_name: &'static str) -> CustomResult<T, crate::errors::ValidationError> {
        self.ok_or(crate::errors::ValidationError::MissingRequiredField { field_name }.into())
    }
}
