//! JWT token generation and validation
//!
//! Tokens are signed HS256 with a process-wide secret and carry the identity
//! snapshot taken at issuance. Verification is stateless: signature plus
//! expiry only, never a database lookup.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

use crate::types::PortalError;

/// Claims carried in a session token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    /// Account username
    pub username: String,
    /// Tenant tag the account belongs to
    pub system: String,
    /// Classification label granted to this account
    pub role: String,
    /// Last login time in ms since epoch, snapshotted at issuance
    #[serde(rename = "lastLoggedInDt")]
    pub last_logged_in_at: i64,
    /// Issued-at (seconds since epoch)
    pub iat: u64,
    /// Expiry (seconds since epoch)
    pub exp: u64,
}

impl Claims {
    /// Composite lookup key used by the account store
    pub fn username_system(&self) -> String {
        format!("{}_{}", self.username, self.system)
    }
}

/// Input for token generation
#[derive(Debug, Clone)]
pub struct TokenInput {
    pub username: String,
    pub system: String,
    pub role: String,
    pub last_logged_in_at: i64,
}

/// Issues and verifies session tokens
#[derive(Clone)]
pub struct JwtValidator {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    expiry_seconds: u64,
}

impl JwtValidator {
    /// Create a validator from the configured secret and expiry window.
    ///
    /// An empty secret is a configuration fault, not a degraded mode.
    pub fn new(secret: &str, expiry_seconds: u64) -> Result<Self, PortalError> {
        if secret.is_empty() {
            return Err(PortalError::Config("JWT secret must not be empty".into()));
        }

        let mut validation = Validation::default();
        validation.leeway = 0;

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            expiry_seconds,
        })
    }

    /// Generate a signed token for the given identity snapshot
    pub fn generate_token(&self, input: TokenInput) -> Result<String, PortalError> {
        let now = unix_now();
        let claims = Claims {
            username: input.username,
            system: input.system,
            role: input.role,
            last_logged_in_at: input.last_logged_in_at,
            iat: now,
            exp: now + self.expiry_seconds,
        };

        info!("Generating token for {}", claims.username_system());

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            warn!("Token generation failed: {}", e);
            PortalError::Unknown(format!("Failed to generate token: {e}"))
        })
    }

    /// Verify a token and return its claims.
    ///
    /// Fails with [`PortalError::TokenExpired`] past the expiry instant,
    /// [`PortalError::TokenFormat`] for structural or signature failures, and
    /// [`PortalError::Unknown`] for anything else.
    pub fn verify_token(&self, token: &str) -> Result<Claims, PortalError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => PortalError::TokenExpired,
                jsonwebtoken::errors::ErrorKind::InvalidToken
                | jsonwebtoken::errors::ErrorKind::InvalidSignature
                | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm
                | jsonwebtoken::errors::ErrorKind::Base64(_)
                | jsonwebtoken::errors::ErrorKind::Json(_)
                | jsonwebtoken::errors::ErrorKind::Utf8(_) => PortalError::TokenFormat,
                _ => PortalError::Unknown(format!("Failed to decode token: {e}")),
            })
    }

    /// Expiry window applied at issuance, in seconds
    pub fn expiry_seconds(&self) -> u64 {
        self.expiry_seconds
    }
}

/// Extract the token from an `Authorization: Bearer <token>` header value
pub fn extract_token_from_header(header: Option<&str>) -> Option<&str> {
    header
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn validator(secret: &str) -> JwtValidator {
        JwtValidator::new(secret, 3600).unwrap()
    }

    fn input() -> TokenInput {
        TokenInput {
            username: "alice".into(),
            system: "fnd".into(),
            role: "R2".into(),
            last_logged_in_at: 1_700_000_000_000,
        }
    }

    #[test]
    fn test_round_trip() {
        let jwt = validator("test-secret");
        let token = jwt.generate_token(input()).unwrap();

        let claims = jwt.verify_token(&token).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.system, "fnd");
        assert_eq!(claims.role, "R2");
        assert_eq!(claims.last_logged_in_at, 1_700_000_000_000);
        assert_eq!(claims.exp, claims.iat + 3600);
        assert_eq!(claims.username_system(), "alice_fnd");
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            JwtValidator::new("", 3600),
            Err(PortalError::Config(_))
        ));
    }

    #[test]
    fn test_wrong_secret_is_format_error() {
        let token = validator("secret-a").generate_token(input()).unwrap();

        let err = validator("secret-b").verify_token(&token).unwrap_err();
        assert!(matches!(err, PortalError::TokenFormat));
    }

    #[test]
    fn test_corrupted_token_is_format_error() {
        let jwt = validator("test-secret");
        let mut token = jwt.generate_token(input()).unwrap();
        token.push_str("tampered");

        assert!(matches!(
            jwt.verify_token(&token).unwrap_err(),
            PortalError::TokenFormat
        ));
        assert!(matches!(
            jwt.verify_token("not.a.token").unwrap_err(),
            PortalError::TokenFormat
        ));
    }

    #[test]
    fn test_expired_token() {
        let jwt = validator("test-secret");

        // Hand-craft claims already past expiry
        let now = unix_now();
        let claims = Claims {
            username: "alice".into(),
            system: "fnd".into(),
            role: "R2".into(),
            last_logged_in_at: 0,
            iat: now - 7200,
            exp: now - 3600,
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"test-secret"),
        )
        .unwrap();

        assert!(matches!(
            jwt.verify_token(&token).unwrap_err(),
            PortalError::TokenExpired
        ));
    }

    #[test]
    fn test_extract_token_from_header() {
        assert_eq!(
            extract_token_from_header(Some("Bearer abc.def.ghi")),
            Some("abc.def.ghi")
        );
        assert_eq!(extract_token_from_header(Some("Bearer ")), None);
        assert_eq!(extract_token_from_header(Some("Basic abc")), None);
        assert_eq!(extract_token_from_header(None), None);
    }
}
