//! HTTP routes for authentication
//!
//! - POST /auth/preflight         - Does this identity exist; register or login next
//! - POST /auth/login             - Authenticate and get a session token
//! - POST /auth/register          - Create credentials and get a session token
//! - POST /auth/verification     - Verify a token and re-check the account
//! - POST /auth/password/validate - Re-confirm the current password (token required)
//! - POST /auth/password/update   - Overwrite the password (token required)

use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::filter;
use crate::routes::response::{
    bad_request, cors_preflight, from_denial, from_error, get_auth_header, method_not_allowed,
    not_found, ok, parse_json_body, BoxBody,
};
use crate::server::AppState;

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct PreflightRequest {
    username: Option<String>,
    system: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
    system: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: Option<String>,
    password: Option<String>,
    system: Option<String>,
    role: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerificationRequest {
    token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ValidatePasswordRequest {
    password: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePasswordRequest {
    new_password: Option<String>,
}

/// Pull a required string field out of a request, naming it on failure
fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, Response<BoxBody>> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(bad_request(format!("Invalid field - [{name}]"))),
    }
}

/// The tenant tag must be the single recognized value
fn require_system<'a>(
    field: &'a Option<String>,
    state: &AppState,
) -> Result<&'a str, Response<BoxBody>> {
    let system = require(field, "system")?;
    if system != state.args.system_tag {
        return Err(bad_request("Invalid field - [system]"));
    }
    Ok(system)
}

// =============================================================================
// Route Handlers
// =============================================================================

/// POST /auth/preflight
///
/// Step to determine whether an identity exists and whether to proceed to
/// register or to login.
async fn handle_preflight(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: PreflightRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let username = match require(&body.username, "username") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let system = match require_system(&body.system, &state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.auth.check_username(username, system).await {
        Ok(result) => ok(result),
        Err(e) => from_error(&e),
    }
}

/// POST /auth/login
async fn handle_login(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: LoginRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let username = match require(&body.username, "username") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match require(&body.password, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let system = match require_system(&body.system, &state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.auth.login(username, password, system).await {
        Ok(result) => ok(result),
        Err(e) => from_error(&e),
    }
}

/// POST /auth/register
async fn handle_register(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: RegisterRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let username = match require(&body.username, "username") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match require(&body.password, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let system = match require_system(&body.system, &state) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let role = match require(&body.role, "role") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.auth.register(username, password, system, role).await {
        Ok(result) => ok(result),
        Err(e) => from_error(&e),
    }
}

/// POST /auth/verification
///
/// Verify a token and re-check that the account behind it still exists.
async fn handle_verification(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let body: VerificationRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let token = match require(&body.token, "token") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state.auth.authenticate_token(token).await {
        Ok(result) => ok(result),
        Err(e) => from_error(&e),
    }
}

/// POST /auth/password/validate (token required)
async fn handle_password_validate(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match filter::authorize(get_auth_header(&req), &state.jwt) {
        Ok(c) => c,
        Err(denial) => return from_denial(&denial),
    };

    let body: ValidatePasswordRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let password = match require(&body.password, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .auth
        .validate_password(&claims.username_system(), password)
        .await
    {
        Ok(result) => ok(result),
        Err(e) => from_error(&e),
    }
}

/// POST /auth/password/update (token required)
async fn handle_password_update(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match filter::authorize(get_auth_header(&req), &state.jwt) {
        Ok(c) => c,
        Err(denial) => return from_denial(&denial),
    };

    let body: UpdatePasswordRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let new_password = match require(&body.new_password, "newPassword") {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    match state
        .auth
        .update_password(&claims.username_system(), new_password)
        .await
    {
        Ok(()) => ok(json!(null)),
        Err(e) => from_error(&e),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Handle auth-related HTTP requests.
///
/// Returns Some(response) if the request was handled, None if it is not an
/// auth route.
pub async fn handle_auth_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/auth") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    // Remove query string for matching
    let path = path.split('?').next().unwrap_or(path).to_string();

    let response = match (method.clone(), path.as_str()) {
        (Method::POST, "/auth/preflight") => handle_preflight(req, state).await,
        (Method::POST, "/auth/login") => handle_login(req, state).await,
        (Method::POST, "/auth/register") => handle_register(req, state).await,
        (Method::POST, "/auth/verification") => handle_verification(req, state).await,
        (Method::POST, "/auth/password/validate") => handle_password_validate(req, state).await,
        (Method::POST, "/auth/password/update") => handle_password_update(req, state).await,

        (_, "/auth/preflight")
        | (_, "/auth/login")
        | (_, "/auth/register")
        | (_, "/auth/verification")
        | (_, "/auth/password/validate")
        | (_, "/auth/password/update") => method_not_allowed(),

        _ => not_found(&path),
    };

    Some(response)
}
