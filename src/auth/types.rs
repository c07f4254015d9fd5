//! Types for the login exchange

use serde::{Deserialize, Serialize};

use super::session::{Role, Session};
use crate::error::Error;

/// Login credentials
#[derive(Clone, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: &str, password: &str) -> Self {
        Self {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    /// Required-field checks run before anything is sent
    pub fn validate(&self) -> Result<(), Error> {
        if self.username.trim().is_empty() {
            return Err(Error::validation("username is required"));
        }
        if self.password.is_empty() {
            return Err(Error::validation("password is required"));
        }
        Ok(())
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// The user record returned by the login endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct LoginUser {
    pub id: String,
    pub username: String,
    pub role: Role,
}

/// Login endpoint payload, either `{ user, token }` or `{ error, message }`
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub user: Option<LoginUser>,
    pub token: Option<String>,
    /// Some backends send `true`, others a string
    pub error: Option<serde_json::Value>,
    pub message: Option<String>,
}

impl LoginResponse {
    /// Turn the payload into a session, or the server's reason for refusing
    pub fn into_session(self) -> Result<Session, Error> {
        let flagged = match &self.error {
            None | Some(serde_json::Value::Null) => false,
            Some(serde_json::Value::Bool(flag)) => *flag,
            Some(_) => true,
        };

        if flagged {
            let message = self
                .message
                .or_else(|| {
                    self.error
                        .as_ref()
                        .and_then(|e| e.as_str())
                        .map(str::to_string)
                })
                .unwrap_or_else(|| "login rejected".to_string());
            return Err(Error::Authentication(message));
        }

        match (self.user, self.token) {
            (Some(user), Some(token)) if !token.is_empty() => Ok(Session {
                user_id: user.id,
                username: user.username,
                role: user.role,
                token,
            }),
            _ => Err(Error::authentication(
                self.message
                    .unwrap_or_else(|| "login response carried no session".to_string()),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_required_fields() {
        assert!(Credentials::new("", "pw").validate().is_err());
        assert!(Credentials::new("ana", "").validate().is_err());
        assert!(Credentials::new("ana", "pw").validate().is_ok());
    }

    #[test]
    fn test_error_payload_becomes_authentication_error() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "error": true,
            "message": "Invalid username or password"
        }))
        .unwrap();

        match response.into_session() {
            Err(Error::Authentication(message)) => {
                assert_eq!(message, "Invalid username or password")
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_success_payload_becomes_session() {
        let response: LoginResponse = serde_json::from_value(serde_json::json!({
            "user": { "id": "7", "username": "ana", "role": "admin" },
            "token": "jwt"
        }))
        .unwrap();

        let session = response.into_session().unwrap();
        assert_eq!(session.user_id, "7");
        assert_eq!(session.role, Role::Admin);
        assert_eq!(session.token, "jwt");
    }
}
