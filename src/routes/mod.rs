//! HTTP route handlers

pub mod auth_routes;
pub mod health;
pub mod portal_routes;
pub mod response;

pub use auth_routes::handle_auth_request;
pub use health::{health_check, version_info};
pub use portal_routes::handle_portal_request;
