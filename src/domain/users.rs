use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::ids::{TokenId, UserId};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub uuid: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub username: String,
    pub uuid: String,
}

impl NewUser {
    /// New user with a freshly generated stable public identifier.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            uuid: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// An API token. Only the sha256 hash is stored; the raw token is shown to
/// the user once at creation time.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Token {
    pub id: TokenId,
    pub user_id: UserId,
    pub token_hash: String,
    pub name: String,
    pub revoked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub const fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewToken {
    pub user_id: UserId,
    pub token_hash: String,
    pub name: String,
}

impl NewToken {
    pub fn new(user_id: UserId, token_hash: String, name: String) -> Self {
        Self {
            user_id,
            token_hash,
            name,
        }
    }
}
