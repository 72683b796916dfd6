//! Error types shared across the portal
//!
//! Every fallible operation in the crate returns [`PortalError`]. Each
//! variant carries a stable snake_case code and an HTTP status so the route
//! layer can translate errors into response envelopes 1:1.

use hyper::StatusCode;
use thiserror::Error;

/// Convenience alias used throughout the crate
pub type Result<T> = std::result::Result<T, PortalError>;

/// Portal-wide error type
#[derive(Debug, Error)]
pub enum PortalError {
    /// A request field is missing or malformed
    #[error("Invalid field - [{0}]")]
    InvalidRequest(String),

    /// Account not found or password mismatch - deliberately undifferentiated
    #[error("Invalid login credentials")]
    InvalidCredentials,

    /// Token signature is valid but the token is past expiry
    #[error("The provided token has expired.")]
    TokenExpired,

    /// Token is structurally invalid, unsigned, or signed with another secret
    #[error("The provided token is not in the correct format.")]
    TokenFormat,

    /// Store insert failed
    #[error("Entity creation failed for {0}")]
    EntityCreation(String),

    /// Store update failed or no matching active row
    #[error("Entity update failed for {0}")]
    EntityUpdate(String),

    /// Store read failed
    #[error("Entity retrieval failed")]
    EntityRetrieval,

    /// Target row does not exist
    #[error("Entity not found")]
    NotFound,

    /// Store-level fault
    #[error("Database error: {0}")]
    Database(String),

    /// Missing or invalid process configuration
    #[error("Configuration error: {0}")]
    Config(String),

    /// Catch-all internal fault
    #[error("Something went wrong")]
    Unknown(String),
}

impl PortalError {
    /// Stable machine-readable code, mirrored into the response envelope
    pub fn code(&self) -> &'static str {
        match self {
            PortalError::InvalidRequest(_) => "invalid_request",
            PortalError::InvalidCredentials => "invalid_login_credentials",
            PortalError::TokenExpired => "token_expired",
            PortalError::TokenFormat => "token_format",
            PortalError::EntityCreation(_) => "entity_creation_failed",
            PortalError::EntityUpdate(_) => "entity_update_failed",
            PortalError::EntityRetrieval => "entity_retrieval_failed",
            PortalError::NotFound => "entity_not_found",
            PortalError::Database(_) => "database_error",
            PortalError::Config(_) => "configuration_error",
            PortalError::Unknown(_) => "unknown",
        }
    }

    /// HTTP status the route layer maps this error to
    pub fn http_status(&self) -> StatusCode {
        match self {
            PortalError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            PortalError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            PortalError::TokenExpired => StatusCode::UNAUTHORIZED,
            PortalError::TokenFormat => StatusCode::BAD_REQUEST,
            PortalError::EntityCreation(_) => StatusCode::BAD_REQUEST,
            PortalError::EntityUpdate(_) => StatusCode::BAD_REQUEST,
            PortalError::EntityRetrieval => StatusCode::NOT_FOUND,
            PortalError::NotFound => StatusCode::NOT_FOUND,
            PortalError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PortalError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            PortalError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<std::io::Error> for PortalError {
    fn from(e: std::io::Error) -> Self {
        PortalError::Unknown(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            PortalError::InvalidCredentials.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PortalError::TokenExpired.http_status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            PortalError::TokenFormat.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            PortalError::Unknown("boom".into()).http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_codes_are_stable() {
        assert_eq!(PortalError::TokenExpired.code(), "token_expired");
        assert_eq!(
            PortalError::EntityUpdate("notices".into()).code(),
            "entity_update_failed"
        );
        assert_eq!(
            PortalError::InvalidCredentials.code(),
            "invalid_login_credentials"
        );
    }

    #[test]
    fn test_messages_do_not_leak_internals() {
        // The Unknown payload is for logs, not for clients
        let err = PortalError::Unknown("secret detail".into());
        assert_eq!(err.to_string(), "Something went wrong");
    }
}
