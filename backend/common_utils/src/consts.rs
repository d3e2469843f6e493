//! Header names, log field names, and other string constants shared by the
//! gateway and its drivers.

/// Header carrying the authenticated tenant id (ingress: "bearer
/// auth carrying tenantId").
pub const X_TENANT_ID: &str = "x-tenant-id";
/// Header carrying a caller-supplied or gateway-minted request id.
pub const X_REQUEST_ID: &str = "x-request-id";
/// Header identifying which provider a request targets, set by the router
/// glue (out of core scope) and echoed into logs here.
pub const X_PROVIDER: &str = "x-provider";

pub const NO_ERROR_MESSAGE: &str = "No error message";
pub const NO_ERROR_CODE: &str = "No error code";
/// Placeholder used wherever a sensitive field is masked before logging.
pub const REDACTED: &str = "REDACTED";

/// Minimum PAN length accepted before masking (ISO/IEC 7812).
pub const MIN_CARD_NUMBER_LENGTH: usize = 12;
pub const MAX_CARD_NUMBER_LENGTH: usize = 19;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Env {
    Development,
    Production,
}

impl Env {
    pub const fn current_env() -> Self {
        if cfg!(debug_assertions) {
            Self::Development
        } else {
            Self::Production
        }
    }

    pub const fn config_path(self) -> &'static str {
        match self {
            Self::Development => "development.toml",
            Self::Production => "production.toml",
        }
    }
}

impl std::fmt::Display for Env {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}
