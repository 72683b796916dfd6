//! Authentication and authorization
//!
//! Provides:
//! - JWT token generation and validation
//! - Bearer-token request gating (mandatory and lenient variants)
//! - Classification hierarchy for notice visibility
//! - Password hashing with Argon2

pub mod classification;
pub mod filter;
pub mod jwt;
pub mod password;

pub use classification::Classification;
pub use filter::{authorize, decode_optional_claims, Denial};
pub use jwt::{extract_token_from_header, Claims, JwtValidator, TokenInput};
pub use password::{hash_password, verify_password};
