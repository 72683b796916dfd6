//! Authentication service
//!
//! Orchestrates account existence checks, registration, login, and password
//! maintenance over the account collection. Account-not-found and
//! password-mismatch deliberately collapse into the same
//! [`PortalError::InvalidCredentials`] so login responses cannot be used to
//! enumerate usernames.

use bson::doc;
use serde::Serialize;
use tracing::{info, warn};

use crate::auth::jwt::{JwtValidator, TokenInput};
use crate::auth::password::{hash_password, verify_password};
use crate::db::mongo::is_duplicate_key_error;
use crate::db::schemas::{AccountState, UserDoc, USER_COLLECTION};
use crate::db::{MongoClient, MongoCollection};
use crate::services::now_ms;
use crate::types::{PortalError, Result};

/// Result of the preflight existence check
#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ExistenceCheck {
    pub exist: bool,
    pub next_step: &'static str,
}

/// A freshly issued session token
#[derive(Debug, Serialize)]
pub struct IssuedToken {
    pub token: String,
}

/// Identity decoded from a verified token, plus an account freshness flag
#[derive(Debug, Serialize)]
pub struct TokenIdentity {
    pub username: String,
    pub role: String,
    pub exist: bool,
}

/// Result of re-confirming a current password
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordCheck {
    pub is_valid: bool,
}

/// Service to handle authentication
#[derive(Clone)]
pub struct AuthService {
    users: MongoCollection<UserDoc>,
    jwt: JwtValidator,
}

impl AuthService {
    /// Open the account collection and wire in the token validator
    pub async fn new(mongo: &MongoClient, jwt: JwtValidator) -> Result<Self> {
        let users = mongo.collection::<UserDoc>(USER_COLLECTION).await?;
        Ok(Self { users, jwt })
    }

    /// Check whether an identity exists within a system.
    ///
    /// Used as a preflight step before the client chooses register vs login.
    pub async fn check_username(&self, username: &str, system: &str) -> Result<ExistenceCheck> {
        let existing = self
            .users
            .find_one(doc! { "username": username, "system": system })
            .await?;

        if existing.is_some() {
            info!("Found username: {} in system: {}", username, system);
            return Ok(ExistenceCheck {
                exist: true,
                next_step: "login",
            });
        }

        info!(
            "Username: {} does not exist within system: {}",
            username, system
        );
        Ok(ExistenceCheck {
            exist: false,
            next_step: "register",
        })
    }

    /// Create a new account and log it in immediately.
    ///
    /// The unique index on `username_system` is the uniqueness guard; a
    /// duplicate-key conflict means the identity already exists regardless of
    /// what any earlier read said.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        system: &str,
        role: &str,
    ) -> Result<IssuedToken> {
        info!(
            "Creating user: {} for system: {} with role: {}",
            username, system, role
        );

        let password_hash = hash_password(password)?;
        let user = UserDoc::new(
            username.to_string(),
            system.to_string(),
            password_hash,
            role.to_string(),
        );

        if let Err(e) = self.users.insert_one(user).await {
            if is_duplicate_key_error(&e) {
                warn!("Account already exists: {}_{}", username, system);
            } else {
                warn!("Failed to create account {}_{}: {}", username, system, e);
            }
            return Err(PortalError::EntityCreation(USER_COLLECTION.to_string()));
        }

        info!("Successfully created {}_{}", username, system);

        self.login(username, password, system).await
    }

    /// Authenticate and issue a session token.
    ///
    /// On success the token and login time are persisted on the account row;
    /// the stored token copy is informational only and is never consulted by
    /// verification, so earlier unexpired tokens stay valid.
    pub async fn login(&self, username: &str, password: &str, system: &str) -> Result<IssuedToken> {
        let username_system = format!("{}_{}", username, system);
        info!("Attempting to login for {}", username_system);

        let Some(user) = self
            .users
            .find_one(doc! { "username_system": &username_system })
            .await?
        else {
            warn!("Login failed for {}", username_system);
            return Err(PortalError::InvalidCredentials);
        };

        if !verify_password(password, &user.password_hash) {
            warn!("Login failed for {}", username_system);
            return Err(PortalError::InvalidCredentials);
        }

        // Claims carry the login time as stored before this login
        let token = self.jwt.generate_token(TokenInput {
            username: user.username.clone(),
            system: user.system.clone(),
            role: user.role.clone(),
            last_logged_in_at: user.last_logged_in_at,
        })?;

        let active = bson::to_bson(&AccountState::Active)
            .map_err(|e| PortalError::Database(e.to_string()))?;
        self.users
            .update_one(
                doc! { "username_system": &username_system },
                doc! { "$set": {
                    "current_token": token.as_str(),
                    "last_logged_in_at": now_ms(),
                    "state": active,
                    "metadata.updated_at": bson::DateTime::now(),
                }},
            )
            .await?;

        info!("Success login for {}", username_system);

        Ok(IssuedToken { token })
    }

    /// Verify a token and re-check that its account still exists.
    ///
    /// Distinct from pure signature verification: this answers "is this
    /// still a real, current account".
    pub async fn authenticate_token(&self, token: &str) -> Result<TokenIdentity> {
        let claims = self.jwt.verify_token(token)?;

        let check = self
            .check_username(&claims.username, &claims.system)
            .await?;

        info!(
            "Does {} exist - {}",
            claims.username_system(),
            check.exist
        );

        Ok(TokenIdentity {
            username: claims.username,
            role: claims.role,
            exist: check.exist,
        })
    }

    /// Re-confirm an account's current password.
    ///
    /// A mismatch is a normal answer, not an error; a missing account
    /// collapses into the same credentials failure as login.
    pub async fn validate_password(
        &self,
        username_system: &str,
        password: &str,
    ) -> Result<PasswordCheck> {
        info!("Validating password for {}", username_system);

        let Some(user) = self
            .users
            .find_one(doc! { "username_system": username_system })
            .await?
        else {
            warn!("Password validation failed for {}", username_system);
            return Err(PortalError::InvalidCredentials);
        };

        let is_valid = verify_password(password, &user.password_hash);
        info!(
            "Password validation result for {} - {}",
            username_system, is_valid
        );

        Ok(PasswordCheck { is_valid })
    }

    /// Re-hash and overwrite an account's password.
    ///
    /// No old-password check here: the route is gated by the mandatory
    /// filter, and callers wanting re-confirmation use `validate_password`
    /// first.
    pub async fn update_password(&self, username_system: &str, new_password: &str) -> Result<()> {
        info!("Updating password for {}", username_system);

        let password_hash = hash_password(new_password)?;

        let result = self
            .users
            .update_one(
                doc! { "username_system": username_system },
                doc! { "$set": {
                    "password_hash": password_hash,
                    "metadata.updated_at": bson::DateTime::now(),
                }},
            )
            .await?;

        if result.matched_count == 0 {
            warn!("No account found for {}", username_system);
            return Err(PortalError::EntityUpdate(USER_COLLECTION.to_string()));
        }

        info!("Successfully updated password for {}", username_system);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_existence_check_serialization() {
        let check = ExistenceCheck {
            exist: false,
            next_step: "register",
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["exist"], false);
        assert_eq!(json["nextStep"], "register");
    }

    #[test]
    fn test_password_check_serialization() {
        let check = PasswordCheck { is_valid: true };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["isValid"], true);
    }

    // Register/login flows need a running MongoDB; the token, hashing, and
    // filter layers they compose are unit-tested in their own modules.
}
