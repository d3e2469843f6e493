//! Crate-local error types. The gateway-wide error taxonomy
//! lives in `domain_types::errors::GatewayError`; these are the lower-level
//! errors that feed into it via `change_context`.

/// `error_stack::Result` alias used throughout the workspace.
pub type CustomResult<T, E> = error_stack::Result<T, E>;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid value found for field: {field_name}")]
    IncorrectValueProvided { field_name: &'static str },
    #[error("Missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("{message}")]
    InvalidValue { message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum ParsingError {
    #[error("Failed to parse struct: {0}")]
    StructParseFailure(&'static str),
    #[error("Failed to serialize to {0} format")]
    EncodeError(&'static str),
    #[error("Failed to parse date/time: {0}")]
    DateTimeParsingError(String),
}
