//! Bearer-token request gating
//!
//! The mandatory filter runs before any protected handler body: a request
//! without a usable `Authorization` header is rejected as a bad request
//! before verification is even attempted, and any verification failure
//! collapses to a single opaque denial so token internals never reach the
//! client.
//!
//! The lenient variant exists for the notice listing only, where an
//! anonymous caller is a valid caller.

use tracing::warn;

use crate::auth::jwt::{extract_token_from_header, Claims, JwtValidator};
use crate::types::PortalError;

/// Why the mandatory filter rejected a request
#[derive(Debug, PartialEq, Eq)]
pub enum Denial {
    /// Missing or malformed `Authorization` header - rejected pre-verification
    BadRequest(&'static str),
    /// Token failed verification; the specific kind is deliberately swallowed
    Unauthorized,
}

/// Gate a request behind a valid bearer token.
///
/// `auth_header` is the raw `Authorization` header value, if any.
pub fn authorize(auth_header: Option<&str>, jwt: &JwtValidator) -> Result<Claims, Denial> {
    if auth_header.is_none() {
        warn!("Missing Header - Authorization");
        return Err(Denial::BadRequest("Invalid Header - Authorization"));
    }

    let Some(token) = extract_token_from_header(auth_header) else {
        warn!("Invalid Format - Authorization");
        return Err(Denial::BadRequest("Invalid Format - Authorization"));
    };

    jwt.verify_token(token).map_err(|e| {
        warn!("Invalid token: {}", e);
        Denial::Unauthorized
    })
}

/// Decode claims opportunistically for the anonymous-vs-classified listing.
///
/// No header means an anonymous caller, not an error. A header that is
/// present but carries an invalid token is still a typed failure: a caller
/// who chose to present credentials gets told when they are bad.
pub fn decode_optional_claims(
    auth_header: Option<&str>,
    jwt: &JwtValidator,
) -> Result<Option<Claims>, PortalError> {
    let Some(token) = extract_token_from_header(auth_header) else {
        return Ok(None);
    };

    jwt.verify_token(token).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::jwt::TokenInput;

    fn jwt() -> JwtValidator {
        JwtValidator::new("filter-test-secret", 3600).unwrap()
    }

    fn bearer(jwt: &JwtValidator) -> String {
        let token = jwt
            .generate_token(TokenInput {
                username: "alice".into(),
                system: "fnd".into(),
                role: "R2".into(),
                last_logged_in_at: 0,
            })
            .unwrap();
        format!("Bearer {token}")
    }

    #[test]
    fn test_missing_header_is_bad_request() {
        let err = authorize(None, &jwt()).unwrap_err();
        assert_eq!(err, Denial::BadRequest("Invalid Header - Authorization"));
    }

    #[test]
    fn test_missing_token_segment_is_bad_request() {
        let err = authorize(Some("Bearer "), &jwt()).unwrap_err();
        assert_eq!(err, Denial::BadRequest("Invalid Format - Authorization"));

        let err = authorize(Some("Basic abc"), &jwt()).unwrap_err();
        assert_eq!(err, Denial::BadRequest("Invalid Format - Authorization"));
    }

    #[test]
    fn test_invalid_token_is_unauthorized() {
        let err = authorize(Some("Bearer garbage"), &jwt()).unwrap_err();
        assert_eq!(err, Denial::Unauthorized);

        // Token signed with another secret is just as unauthorized - the
        // format/expiry distinction stays on the server side
        let other = JwtValidator::new("other-secret", 3600).unwrap();
        let header = bearer(&other);
        let err = authorize(Some(&header), &jwt()).unwrap_err();
        assert_eq!(err, Denial::Unauthorized);
    }

    #[test]
    fn test_valid_token_attaches_claims() {
        let jwt = jwt();
        let header = bearer(&jwt);

        let claims = authorize(Some(&header), &jwt).unwrap();
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.role, "R2");
    }

    #[test]
    fn test_lenient_decode() {
        let jwt = jwt();

        // Anonymous caller: no header, no claims, no error
        assert!(decode_optional_claims(None, &jwt).unwrap().is_none());

        // Presented credentials decode to claims
        let header = bearer(&jwt);
        let claims = decode_optional_claims(Some(&header), &jwt).unwrap().unwrap();
        assert_eq!(claims.username, "alice");

        // Presented but invalid credentials are a typed failure
        assert!(decode_optional_claims(Some("Bearer junk"), &jwt).is_err());
    }
}
