//! Account document schema
//!
//! Stores portal credentials. The composite `username_system` key is the
//! lookup and update key everywhere after creation, and its unique index is
//! what actually enforces "at most one active account per identity".

use bson::{doc, oid::ObjectId, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::{IntoIndexes, MutMetadata};
use crate::db::schemas::Metadata;

/// Collection name for accounts
pub const USER_COLLECTION: &str = "users";

/// Account lifecycle state
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountState {
    /// Created but never logged in
    #[default]
    Register,
    /// Logged in at least once
    Active,
}

/// Account document
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct UserDoc {
    /// MongoDB document ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub _id: Option<ObjectId>,

    /// Common metadata (created_at, updated_at, is_deleted)
    #[serde(default)]
    pub metadata: Metadata,

    /// Account username
    pub username: String,

    /// Tenant tag the account belongs to
    pub system: String,

    /// Composite key: `{username}_{system}`
    pub username_system: String,

    /// Argon2 password hash
    pub password_hash: String,

    /// Classification label granted to this account
    pub role: String,

    /// Lifecycle state
    #[serde(default)]
    pub state: AccountState,

    /// Last login time in ms since epoch
    #[serde(default)]
    pub last_logged_in_at: i64,

    /// Last issued token, stored for reference only - never consulted during
    /// verification, so re-login does not revoke earlier tokens
    #[serde(default)]
    pub current_token: String,

    /// Who created the row
    #[serde(default)]
    pub created_by: String,

    /// Who last updated the row
    #[serde(default)]
    pub updated_by: String,
}

impl UserDoc {
    /// Create a new, never-logged-in account
    pub fn new(
        username: String,
        system: String,
        password_hash: String,
        role: String,
    ) -> Self {
        let username_system = format!("{}_{}", username, system);
        Self {
            _id: None,
            metadata: Metadata::new(),
            username,
            system,
            username_system,
            password_hash,
            role,
            state: AccountState::Register,
            last_logged_in_at: 0,
            current_token: String::new(),
            created_by: "SYSTEM".to_string(),
            updated_by: String::new(),
        }
    }
}

impl IntoIndexes for UserDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            // Unique index on the composite key - the uniqueness invariant
            (
                doc! { "username_system": 1 },
                Some(
                    IndexOptions::builder()
                        .unique(true)
                        .name("username_system_unique".to_string())
                        .build(),
                ),
            ),
            // Index for (username, system) preflight lookups
            (
                doc! { "username": 1, "system": 1 },
                Some(
                    IndexOptions::builder()
                        .name("username_system_pair_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}

impl MutMetadata for UserDoc {
    fn mut_metadata(&mut self) -> &mut Metadata {
        &mut self.metadata
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_shape() {
        let user = UserDoc::new(
            "alice".into(),
            "fnd".into(),
            "$argon2id$stub".into(),
            "R2".into(),
        );

        assert_eq!(user.username_system, "alice_fnd");
        assert_eq!(user.state, AccountState::Register);
        assert_eq!(user.created_by, "SYSTEM");
        assert!(user.current_token.is_empty());
        assert!(!user.metadata.is_deleted);
    }

    #[test]
    fn test_state_serializes_uppercase() {
        let json = serde_json::to_string(&AccountState::Register).unwrap();
        assert_eq!(json, "\"REGISTER\"");
        let json = serde_json::to_string(&AccountState::Active).unwrap();
        assert_eq!(json, "\"ACTIVE\"");
    }

    #[test]
    fn test_unique_index_on_composite_key() {
        let indices = UserDoc::into_indices();
        let (keys, opts) = &indices[0];
        assert_eq!(keys, &doc! { "username_system": 1 });
        assert_eq!(opts.as_ref().unwrap().unique, Some(true));
    }
}
