//! HTTP routes for notices and events
//!
//! The notice listing is the one lenient path: it serves anonymous callers
//! at `OPEN` clearance and classified callers at the clearance carried in
//! their token. Every mutation is gated by the mandatory filter.

use hyper::{Method, Request, Response};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::{filter, Classification, Claims};
use crate::routes::response::{
    bad_request, cors_preflight, from_denial, from_error, get_auth_header, method_not_allowed,
    not_found, ok, parse_json_body, BoxBody,
};
use crate::server::AppState;
use crate::services::{EventInput, NoticeInput};

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct CreateNoticeRequest {
    #[serde(rename = "type")]
    notice_type: Option<String>,
    title: Option<String>,
    content: Option<String>,
    classification: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateNoticeRequest {
    id: Option<String>,
    #[serde(rename = "type")]
    notice_type: Option<String>,
    title: Option<String>,
    content: Option<String>,
    classification: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CreateEventRequest {
    event_dt: Option<i64>,
    title: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct UpdateEventRequest {
    id: Option<String>,
    event_dt: Option<i64>,
    title: Option<String>,
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntityIdRequest {
    id: Option<String>,
}

fn require<'a>(field: &'a Option<String>, name: &str) -> Result<&'a str, Response<BoxBody>> {
    match field.as_deref() {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(bad_request(format!("Invalid field - [{name}]"))),
    }
}

/// Stored classification labels are strict: an unknown label is a bad
/// request, not a quiet downgrade
fn require_classification(
    field: &Option<String>,
) -> Result<Classification, Response<BoxBody>> {
    require(field, "classification").and_then(|label| {
        Classification::parse_strict(label)
            .ok_or_else(|| bad_request("Invalid field - [classification]"))
    })
}

fn authorize_request(
    req: &Request<hyper::body::Incoming>,
    state: &AppState,
) -> Result<Claims, Response<BoxBody>> {
    filter::authorize(get_auth_header(req), &state.jwt).map_err(|denial| from_denial(&denial))
}

// =============================================================================
// Notice Handlers
// =============================================================================

/// GET /portal/notices
///
/// Anonymous callers see `OPEN` notices; a caller presenting a valid token
/// sees everything at or below the clearance in their role claim.
async fn handle_get_notices(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let caller = match filter::decode_optional_claims(get_auth_header(&req), &state.jwt) {
        Ok(Some(claims)) => Classification::from_label(&claims.role),
        Ok(None) => Classification::Open,
        Err(e) => return from_error(&e),
    };

    match state.notices.get_all(caller).await {
        Ok(items) => ok(items),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/notices/create (token required)
async fn handle_create_notice(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: CreateNoticeRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let notice_type = match require(&body.notice_type, "type") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let title = match require(&body.title, "title") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let content = match require(&body.content, "content") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let classification = match require_classification(&body.classification) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let input = NoticeInput {
        notice_type,
        title,
        content,
        classification,
    };

    match state.notices.create(input, &claims.username).await {
        Ok(item) => ok(item),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/notices/update (token required)
async fn handle_update_notice(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: UpdateNoticeRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let id = match require(&body.id, "id") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let notice_type = match require(&body.notice_type, "type") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let title = match require(&body.title, "title") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let content = match require(&body.content, "content") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let classification = match require_classification(&body.classification) {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let input = NoticeInput {
        notice_type,
        title,
        content,
        classification,
    };

    match state.notices.update(&id, input, &claims.username).await {
        Ok(()) => ok(json!(null)),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/notices/delete (token required)
async fn handle_delete_notice(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: EntityIdRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let id = match require(&body.id, "id") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };

    match state.notices.delete(&id, &claims.username).await {
        Ok(()) => ok(json!(null)),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/notices/view (token required)
async fn handle_view_notice(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: EntityIdRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let id = match require(&body.id, "id") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };

    match state.notices.view(&id, &claims.username).await {
        Ok(record) => ok(record),
        Err(e) => from_error(&e),
    }
}

// =============================================================================
// Event Handlers
// =============================================================================

/// GET /portal/events
async fn handle_get_events(
    _req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    match state.events.get_all().await {
        Ok(items) => ok(items),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/events/create (token required)
async fn handle_create_event(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: CreateEventRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let Some(event_dt) = body.event_dt else {
        return bad_request("Invalid field - [event_dt]");
    };
    let title = match require(&body.title, "title") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let content = match require(&body.content, "content") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };

    let input = EventInput {
        event_dt,
        title,
        content,
    };

    match state.events.create(input, &claims.username).await {
        Ok(item) => ok(item),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/events/update (token required)
async fn handle_update_event(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: UpdateEventRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let id = match require(&body.id, "id") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let Some(event_dt) = body.event_dt else {
        return bad_request("Invalid field - [event_dt]");
    };
    let title = match require(&body.title, "title") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };
    let content = match require(&body.content, "content") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };

    let input = EventInput {
        event_dt,
        title,
        content,
    };

    match state.events.update(&id, input, &claims.username).await {
        Ok(()) => ok(json!(null)),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/events/delete (token required)
async fn handle_delete_event(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: EntityIdRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let id = match require(&body.id, "id") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };

    match state.events.delete(&id, &claims.username).await {
        Ok(()) => ok(json!(null)),
        Err(e) => from_error(&e),
    }
}

/// POST /portal/events/view (token required)
async fn handle_view_event(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Response<BoxBody> {
    let claims = match authorize_request(&req, &state) {
        Ok(c) => c,
        Err(resp) => return resp,
    };

    let body: EntityIdRequest = match parse_json_body(req).await {
        Ok(b) => b,
        Err(e) => return from_error(&e),
    };

    let id = match require(&body.id, "id") {
        Ok(v) => v.to_string(),
        Err(resp) => return resp,
    };

    match state.events.view(&id, &claims.username).await {
        Ok(record) => ok(record),
        Err(e) => from_error(&e),
    }
}

// =============================================================================
// Router
// =============================================================================

/// Handle portal (notice/event) HTTP requests.
///
/// Returns Some(response) if the request was handled, None if it is not a
/// portal route.
pub async fn handle_portal_request(
    req: Request<hyper::body::Incoming>,
    state: Arc<AppState>,
) -> Option<Response<BoxBody>> {
    let path = req.uri().path();
    let method = req.method();

    if !path.starts_with("/portal") {
        return None;
    }

    if method == Method::OPTIONS {
        return Some(cors_preflight());
    }

    let path = path.split('?').next().unwrap_or(path).to_string();

    let response = match (method.clone(), path.as_str()) {
        (Method::GET, "/portal/notices") => handle_get_notices(req, state).await,
        (Method::POST, "/portal/notices/create") => handle_create_notice(req, state).await,
        (Method::POST, "/portal/notices/update") => handle_update_notice(req, state).await,
        (Method::POST, "/portal/notices/delete") => handle_delete_notice(req, state).await,
        (Method::POST, "/portal/notices/view") => handle_view_notice(req, state).await,

        (Method::GET, "/portal/events") => handle_get_events(req, state).await,
        (Method::POST, "/portal/events/create") => handle_create_event(req, state).await,
        (Method::POST, "/portal/events/update") => handle_update_event(req, state).await,
        (Method::POST, "/portal/events/delete") => handle_delete_event(req, state).await,
        (Method::POST, "/portal/events/view") => handle_view_event(req, state).await,

        (_, "/portal/notices")
        | (_, "/portal/notices/create")
        | (_, "/portal/notices/update")
        | (_, "/portal/notices/delete")
        | (_, "/portal/notices/view")
        | (_, "/portal/events")
        | (_, "/portal/events/create")
        | (_, "/portal/events/update")
        | (_, "/portal/events/delete")
        | (_, "/portal/events/view") => method_not_allowed(),

        _ => not_found(&path),
    };

    Some(response)
}
