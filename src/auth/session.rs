//! Session data held by the auth gate

use serde::{Deserialize, Serialize};

/// Access level of an authenticated user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Standard,
    Restricted,
}

impl Role {
    /// Whether the role may manage other user accounts
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

/// Session data
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    /// The user ID
    pub user_id: String,

    /// The login name
    pub username: String,

    /// The access level
    pub role: Role,

    /// The bearer token attached to authenticated requests
    #[serde(rename = "token")]
    pub token: String,
}

impl Session {
    /// Create a new session
    pub fn new(user_id: &str, username: &str, role: Role, token: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            username: username.to_string(),
            role,
            token: token.to_string(),
        }
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("user_id", &self.user_id)
            .field("username", &self.username)
            .field("role", &self.role)
            .field("token", &"<redacted>")
            .finish()
    }
}
