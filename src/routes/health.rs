//! Health and version endpoints
//!
//! - /health, /healthz - liveness probe
//! - /version - build metadata for deployment verification

use hyper::{Response, StatusCode};
use serde::Serialize;

use crate::routes::response::{full_body, BoxBody};

#[derive(Serialize)]
pub struct HealthResponse {
    pub healthy: bool,
    pub status: &'static str,
    pub version: &'static str,
}

#[derive(Serialize)]
pub struct VersionResponse {
    pub version: &'static str,
    pub git_commit: &'static str,
    pub built_at: &'static str,
}

fn json_body<T: Serialize>(status: StatusCode, body: &T) -> Response<BoxBody> {
    let json = serde_json::to_string(body).unwrap_or_else(|_| "{}".to_string());
    Response::builder()
        .status(status)
        .header("Content-Type", "application/json")
        .body(full_body(json))
        .unwrap()
}

/// Liveness probe - 200 whenever the process is serving
pub fn health_check() -> Response<BoxBody> {
    json_body(
        StatusCode::OK,
        &HealthResponse {
            healthy: true,
            status: "online",
            version: env!("CARGO_PKG_VERSION"),
        },
    )
}

/// Build metadata captured by the build script
pub fn version_info() -> Response<BoxBody> {
    json_body(
        StatusCode::OK,
        &VersionResponse {
            version: env!("CARGO_PKG_VERSION"),
            git_commit: env!("GIT_COMMIT_SHORT"),
            built_at: env!("BUILD_TIMESTAMP"),
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_is_ok() {
        let resp = health_check();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[test]
    fn test_version_is_ok() {
        let resp = version_info();
        assert_eq!(resp.status(), StatusCode::OK);
    }
}
