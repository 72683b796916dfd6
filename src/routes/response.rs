//! Response envelope and request plumbing
//!
//! Every route answers with the same `{code, status, data}` envelope:
//! success is HTTP 200 with `status = "Ok"`, generic failure is HTTP 500
//! with `status = "Ko"`, validation failure is HTTP 400, and typed errors
//! use their own HTTP status with the error message as `status`.

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::Denial;
use crate::types::PortalError;

pub type BoxBody = http_body_util::combinators::BoxBody<Bytes, hyper::Error>;

#[derive(Serialize)]
struct Envelope<T: Serialize> {
    code: u16,
    status: String,
    data: T,
}

fn envelope<T: Serialize>(status: StatusCode, status_text: &str, data: T) -> Response<BoxBody> {
    let body = Envelope {
        code: status.as_u16(),
        status: status_text.to_string(),
        data,
    };
    let json = serde_json::to_string(&body).unwrap_or_else(|_| "{}".to_string());

    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .body(full_body(json))
        .unwrap()
}

/// 200 with `status = "Ok"`
pub fn ok<T: Serialize>(data: T) -> Response<BoxBody> {
    envelope(StatusCode::OK, "Ok", data)
}

/// 500 with `status = "Ko"`
pub fn ko<T: Serialize>(data: T) -> Response<BoxBody> {
    envelope(StatusCode::INTERNAL_SERVER_ERROR, "Ko", data)
}

/// 400 with `status = "Ko"`
pub fn bad_request<T: Serialize>(data: T) -> Response<BoxBody> {
    envelope(StatusCode::BAD_REQUEST, "Ko", data)
}

/// Translate a typed error 1:1 into its declared status and code
pub fn from_error(err: &PortalError) -> Response<BoxBody> {
    match err {
        // Internal faults flatten to the generic Ko envelope
        PortalError::Unknown(_) | PortalError::Database(_) | PortalError::Config(_) => {
            ko(err.to_string())
        }
        _ => envelope(
            err.http_status(),
            &err.to_string(),
            json!({
                "code": err.code(),
                "message": err.to_string(),
                "timestamp": chrono::Utc::now().timestamp_millis(),
            }),
        ),
    }
}

/// Translate a filter denial: pre-verification failures are bad requests,
/// verification failures are an opaque 401
pub fn from_denial(denial: &Denial) -> Response<BoxBody> {
    match denial {
        Denial::BadRequest(message) => bad_request(message),
        Denial::Unauthorized => envelope(
            StatusCode::UNAUTHORIZED,
            "Ko",
            "Invalid or expired token",
        ),
    }
}

pub fn not_found(path: &str) -> Response<BoxBody> {
    envelope(StatusCode::NOT_FOUND, "Ko", format!("Not found - {path}"))
}

pub fn method_not_allowed() -> Response<BoxBody> {
    envelope(StatusCode::METHOD_NOT_ALLOWED, "Ko", "Method not allowed")
}

pub fn cors_preflight() -> Response<BoxBody> {
    Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header("Access-Control-Allow-Origin", "*")
        .header("Access-Control-Allow-Methods", "GET, POST, OPTIONS")
        .header("Access-Control-Allow-Headers", "Content-Type, Authorization")
        .header("Access-Control-Max-Age", "86400")
        .body(empty_body())
        .unwrap()
}

pub fn full_body(data: impl Into<Bytes>) -> BoxBody {
    Full::new(data.into())
        .map_err(|never| match never {})
        .boxed()
}

pub fn empty_body() -> BoxBody {
    Full::new(Bytes::new())
        .map_err(|never| match never {})
        .boxed()
}

/// Read and deserialize a JSON request body, bounded at 10 KiB
pub async fn parse_json_body<T: for<'de> Deserialize<'de>>(
    req: Request<hyper::body::Incoming>,
) -> Result<T, PortalError> {
    let body = req.collect().await.map_err(|e| {
        tracing::warn!("Failed to read request body: {}", e);
        PortalError::InvalidRequest("body".into())
    })?;

    let bytes = body.to_bytes();
    if bytes.len() > 10240 {
        return Err(PortalError::InvalidRequest("body".into()));
    }

    serde_json::from_slice(&bytes).map_err(|e| {
        tracing::warn!("Invalid JSON body: {}", e);
        PortalError::InvalidRequest("body".into())
    })
}

/// Raw `Authorization` header value, if any
pub fn get_auth_header(req: &Request<hyper::body::Incoming>) -> Option<&str> {
    req.headers()
        .get(hyper::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ok_envelope() {
        let resp = ok(json!({"token": "abc"}));
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_typed_error_uses_declared_status() {
        let resp = from_error(&PortalError::TokenExpired);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let resp = from_error(&PortalError::TokenFormat);
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = from_error(&PortalError::InvalidCredentials);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_internal_faults_flatten_to_ko() {
        let resp = from_error(&PortalError::Unknown("boom".into()));
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_denial_mapping() {
        let resp = from_denial(&Denial::BadRequest("Invalid Header - Authorization"));
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = from_denial(&Denial::Unauthorized);
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    }
}
