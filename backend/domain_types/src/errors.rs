//! The gateway-wide error taxonomy. `GatewayError` is the one
//! enum whose variants are the stable surface names clients see
//! (`ValidationError`, `ConfigError`, `TransportError`, `ProviderDecline`,
//! `ProviderFormatError`, `SignatureError`, `CorrelatorError`); each variant
//! carries the HTTP status it maps to so the ingress layer never has to
//! re-derive it.
//!
//! `ConnectorError` is the driver-internal failure type each `interfaces`
//! trait method returns; the dispatcher (C4) folds it into `GatewayError`
//! at the boundary.

use masking::Secret;

pub type ConnectorResult<T> = error_stack::Result<T, ConnectorError>;
pub type GatewayResult<T> = error_stack::Result<T, GatewayError>;

#[derive(Debug, Clone, thiserror::Error)]
pub enum GatewayError {
    #[error("validation failed: {message}")]
    Validation { message: String },
    #[error("tenant configuration error: {message}")]
    Config { message: String },
    #[error("transport error contacting provider: {message}")]
    Transport { message: String },
    #[error("provider declined the request: {code}")]
    ProviderDecline { code: String, message: String },
    #[error("provider response could not be parsed")]
    ProviderFormat { raw_payload: Secret<String> },
    #[error("webhook signature verification failed")]
    Signature,
    #[error("callback token expired, unknown, or already redeemed")]
    Correlator,
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl GatewayError {
    /// The HTTP status this error surfaces as.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation { .. } => 400,
            Self::Config { .. } => 412,
            Self::Transport { .. } => 502,
            Self::ProviderDecline { .. } => 200,
            Self::ProviderFormat { .. } => 502,
            Self::Signature => 400,
            Self::Correlator => 410,
            Self::UnknownProvider(_) => 400,
            Self::Internal(_) => 500,
        }
    }

    /// The stable `errorCode` string echoed in the response body, distinct
    /// from the HTTP status.
    pub fn error_code(&self) -> &str {
        match self {
            Self::Validation { .. } => "VALIDATION_ERROR",
            Self::Config { .. } => "CONFIG_ERROR",
            Self::Transport { .. } => "TRANSPORT",
            Self::ProviderDecline { code, .. } => code,
            Self::ProviderFormat { .. } => "UNKNOWN_RESPONSE",
            Self::Signature => "SIGNATURE_ERROR",
            Self::Correlator => "CORRELATOR_ERROR",
            Self::UnknownProvider(_) => "UNKNOWN_PROVIDER",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

/// Driver-internal error surface, returned by every `interfaces` trait
/// method.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectorError {
    #[error("missing required field: {field_name}")]
    MissingRequiredField { field_name: &'static str },
    #[error("invalid value for field {field_name}: {reason}")]
    InvalidDataFormat {
        field_name: &'static str,
        reason: String,
    },
    #[error("failed to parse the connector response")]
    ResponseDeserializationFailed,
    #[error("request to connector timed out")]
    RequestTimeout,
    #[error("failed to send the request to the connector: {0}")]
    RequestNotSent(String),
    #[error("connector declined the request with code {code}")]
    ProviderDeclined { code: String, message: String },
    #[error("connector returned an unparseable or unexpected payload")]
    UnknownResponse,
    #[error("webhook source verification failed")]
    WebhookSignatureMismatch,
    #[error("missing webhook field: {0}")]
    WebhookFieldMissing(&'static str),
    #[error("payment is not in a cancellable state")]
    NotCancellable,
    #[error("refund amount exceeds remaining refundable amount")]
    RefundAmountExceedsPaymentAmount,
    #[error("{0} is not implemented for this connector")]
    NotImplemented(String),
    #[error("credential configuration is invalid: {0}")]
    InvalidConfig(String),
}

impl From<ConnectorError> for GatewayError {
    fn from(value: ConnectorError) -> Self {
        match value {
            ConnectorError::MissingRequiredField { field_name } => Self::Validation {
                message: format!("missing required field: {field_name}"),
            },
            ConnectorError::InvalidDataFormat { field_name, reason } => Self::Validation {
                message: format!("invalid field {field_name}: {reason}"),
            },
            ConnectorError::RequestTimeout => Self::Transport {
                message: "request timed out".to_owned(),
            },
            ConnectorError::RequestNotSent(reason) => Self::Transport { message: reason },
            ConnectorError::ProviderDeclined { code, message } => {
                Self::ProviderDecline { code, message }
            }
            ConnectorError::ResponseDeserializationFailed | ConnectorError::UnknownResponse => {
                Self::ProviderFormat {
                    raw_payload: Secret::new(String::new()),
                }
            }
            ConnectorError::WebhookSignatureMismatch => Self::Signature,
            ConnectorError::WebhookFieldMissing(field) => Self::Validation {
                message: format!("missing webhook field: {field}"),
            },
            ConnectorError::NotCancellable => Self::Validation {
                message: "payment is not in a cancellable state".to_owned(),
            },
            ConnectorError::RefundAmountExceedsPaymentAmount => Self::Validation {
                message: "refund amount exceeds remaining refundable amount".to_owned(),
            },
            ConnectorError::NotImplemented(op) => Self::Internal(format!("not implemented: {op}")),
            ConnectorError::InvalidConfig(reason) => Self::Config { message: reason },
        }
    }
}
