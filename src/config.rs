//! Configuration for kampong
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use uuid::Uuid;

/// Kampong - REST backend for a community portal
#[derive(Parser, Debug, Clone)]
#[command(name = "kampong")]
#[command(about = "Community portal backend - auth, notices and events")]
pub struct Args {
    /// Unique node identifier for this instance
    #[arg(long, env = "NODE_ID", default_value_t = Uuid::new_v4())]
    pub node_id: Uuid,

    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "kampong")]
    pub mongodb_db: String,

    /// JWT secret for token signing (required)
    #[arg(long, env = "JWT_SECRET")]
    pub jwt_secret: Option<String>,

    /// JWT token expiry in seconds (defaults to one year)
    #[arg(long, env = "JWT_EXPIRY_SECONDS", default_value = "31536000")]
    pub jwt_expiry_seconds: u64,

    /// Tenant tag accepted on preflight/login/register
    #[arg(long, env = "SYSTEM_TAG", default_value = "fnd")]
    pub system_tag: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,
}

impl Args {
    /// Get the JWT secret, failing if unset
    pub fn require_jwt_secret(&self) -> Result<&str, String> {
        self.jwt_secret
            .as_deref()
            .ok_or_else(|| "JWT_SECRET is not set".to_string())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.jwt_secret.is_none() {
            return Err("JWT_SECRET is required".to_string());
        }

        if self.system_tag.is_empty() {
            return Err("SYSTEM_TAG must not be empty".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args() -> Args {
        Args::parse_from(["kampong", "--jwt-secret", "test-secret"])
    }

    #[test]
    fn test_defaults() {
        let args = base_args();
        assert_eq!(args.system_tag, "fnd");
        assert_eq!(args.jwt_expiry_seconds, 31_536_000);
        assert_eq!(args.mongodb_db, "kampong");
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut args = base_args();
        assert!(args.validate().is_ok());

        args.jwt_secret = None;
        let err = args.validate().unwrap_err();
        assert!(err.contains("JWT_SECRET"));
    }

    #[test]
    fn test_validate_rejects_empty_system_tag() {
        let mut args = base_args();
        args.system_tag = String::new();
        assert!(args.validate().is_err());
    }
}
