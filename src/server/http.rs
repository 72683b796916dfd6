//! HTTP server implementation
//!
//! Uses hyper http1 with TokioIo for async handling. One suspendable task
//! per connection; every store and hash call inside a handler is a
//! suspension point.

use hyper::body::Incoming;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response};
use hyper_util::rt::TokioIo;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::auth::JwtValidator;
use crate::config::Args;
use crate::db::MongoClient;
use crate::routes;
use crate::routes::response::{self, BoxBody};
use crate::services::{AuthService, EventService, NoticeService};
use crate::types::{PortalError, Result};

/// Shared application state
pub struct AppState {
    pub args: Args,
    pub mongo: MongoClient,
    /// Session token issuer/verifier, built once at startup from the
    /// configured secret
    pub jwt: JwtValidator,
    pub auth: AuthService,
    pub notices: NoticeService,
    pub events: EventService,
}

impl AppState {
    /// Wire up services over an established store connection.
    ///
    /// Fails fast when the signing secret is missing: the token service
    /// never operates unsigned.
    pub async fn new(args: Args, mongo: MongoClient) -> Result<Self> {
        let secret = args
            .require_jwt_secret()
            .map_err(PortalError::Config)?
            .to_string();
        let jwt = JwtValidator::new(&secret, args.jwt_expiry_seconds)?;

        let auth = AuthService::new(&mongo, jwt.clone()).await?;
        let notices = NoticeService::new(&mongo).await?;
        let events = EventService::new(&mongo).await?;

        Ok(Self {
            args,
            mongo,
            jwt,
            auth,
            notices,
            events,
        })
    }
}

/// Run the HTTP server until the process is stopped
pub async fn run(state: Arc<AppState>) -> Result<()> {
    let listener = TcpListener::bind(state.args.listen).await?;

    info!(
        "Kampong listening on {} as node {}",
        state.args.listen, state.args.node_id
    );

    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let state = Arc::clone(&state);
                tokio::spawn(async move {
                    let io = TokioIo::new(stream);

                    let service = service_fn(move |req| {
                        let state = Arc::clone(&state);
                        async move { handle_request(state, addr, req).await }
                    });

                    if let Err(err) = http1::Builder::new()
                        .serve_connection(io, service)
                        .await
                    {
                        error!("Error serving connection from {}: {:?}", addr, err);
                    }
                });
            }
            Err(e) => {
                error!("Error accepting connection: {:?}", e);
            }
        }
    }
}

/// Route incoming HTTP requests
async fn handle_request(
    state: Arc<AppState>,
    addr: SocketAddr,
    req: Request<Incoming>,
) -> std::result::Result<Response<BoxBody>, hyper::Error> {
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    info!("[{}] {} {}", addr, method, path);

    // Auth routes (/auth/*) consume the request
    if path.starts_with("/auth") {
        if let Some(response) = routes::handle_auth_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(response::not_found(&path));
    }

    // Portal routes (/portal/*) consume the request
    if path.starts_with("/portal") {
        if let Some(response) = routes::handle_portal_request(req, Arc::clone(&state)).await {
            return Ok(response);
        }
        return Ok(response::not_found(&path));
    }

    let response = match (method, path.as_str()) {
        // Liveness probe
        (Method::GET, "/health") | (Method::GET, "/healthz") => routes::health_check(),

        // Version info for deployment verification
        (Method::GET, "/version") => routes::version_info(),

        // CORS preflight
        (Method::OPTIONS, _) => response::cors_preflight(),

        _ => response::not_found(&path),
    };

    Ok(response)
}
