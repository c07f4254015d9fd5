//! Configuration options for the shopfloor client

use std::path::PathBuf;
use std::time::Duration;

use url::Url;

use crate::error::{Error, Result};

/// Default API host used when nothing else is configured
pub const DEFAULT_API_HOST: &str = "http://localhost:8050/api";

/// Configuration options for the shopfloor client
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Base URL every endpoint path is appended to
    pub api_host: String,

    /// Whether the session survives process restarts
    pub persist_session: bool,

    /// Directory holding the persisted session; in-memory storage when unset
    pub storage_dir: Option<PathBuf>,

    /// Storage key the serialized session is written under
    pub session_key: String,

    /// The request timeout
    pub request_timeout: Option<Duration>,

    /// Path of the login endpoint
    pub login_path: String,

    /// Path of the liveness check endpoint
    pub ping_path: String,

    /// Route protected views redirect to when logged out
    pub login_route: String,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            api_host: DEFAULT_API_HOST.to_string(),
            persist_session: true,
            storage_dir: None,
            session_key: "user".to_string(),
            request_timeout: Some(Duration::from_secs(30)),
            login_path: "/login".to_string(),
            ping_path: "/ping".to_string(),
            login_route: "/login".to_string(),
        }
    }
}

impl ClientOptions {
    /// Build options from `SHOPFLOOR_*` environment variables, falling back to defaults
    pub fn from_env() -> Result<Self> {
        let mut options = Self::default();

        if let Ok(host) = std::env::var("SHOPFLOOR_API_HOST") {
            options = options.with_api_host(&host);
        }
        if let Ok(dir) = std::env::var("SHOPFLOOR_STORAGE_DIR") {
            options = options.with_storage_dir(Some(PathBuf::from(dir)));
        }
        if let Ok(key) = std::env::var("SHOPFLOOR_SESSION_KEY") {
            options = options.with_session_key(&key);
        }
        if let Ok(secs) = std::env::var("SHOPFLOOR_REQUEST_TIMEOUT_SECS") {
            let secs: u64 = secs.parse().map_err(|_| {
                Error::config(format!("SHOPFLOOR_REQUEST_TIMEOUT_SECS is not a number: {}", secs))
            })?;
            options = options.with_request_timeout(Some(Duration::from_secs(secs)));
        }

        options.validate()?;
        Ok(options)
    }

    /// Check the options before a client is built from them
    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.api_host)?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "api_host must be an http(s) URL, got {}",
                self.api_host
            )));
        }
        if self.session_key.trim().is_empty() {
            return Err(Error::config("session_key cannot be empty"));
        }
        Ok(())
    }

    /// Set the API host
    pub fn with_api_host(mut self, value: &str) -> Self {
        self.api_host = value.trim_end_matches('/').to_string();
        self
    }

    /// Set whether to persist the session
    pub fn with_persist_session(mut self, value: bool) -> Self {
        self.persist_session = value;
        self
    }

    /// Set the session storage directory
    pub fn with_storage_dir(mut self, value: Option<PathBuf>) -> Self {
        self.storage_dir = value;
        self
    }

    /// Set the session storage key
    pub fn with_session_key(mut self, value: &str) -> Self {
        self.session_key = value.to_string();
        self
    }

    /// Set the request timeout
    pub fn with_request_timeout(mut self, value: Option<Duration>) -> Self {
        self.request_timeout = value;
        self
    }

    /// Set the login endpoint path
    pub fn with_login_path(mut self, value: &str) -> Self {
        self.login_path = value.to_string();
        self
    }

    /// Set the liveness check endpoint path
    pub fn with_ping_path(mut self, value: &str) -> Self {
        self.ping_path = value.to_string();
        self
    }

    /// Set the route protected views redirect to
    pub fn with_login_route(mut self, value: &str) -> Self {
        self.login_route = value.to_string();
        self
    }

    /// Join an endpoint path onto the API host
    pub(crate) fn endpoint(&self, path: &str) -> String {
        format!(
            "{}/{}",
            self.api_host.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_single_slash() {
        let options = ClientOptions::default().with_api_host("http://example.com/api/");
        assert_eq!(options.endpoint("/login"), "http://example.com/api/login");
        assert_eq!(options.endpoint("ping"), "http://example.com/api/ping");
    }

    #[test]
    fn test_validate_rejects_bad_host() {
        let options = ClientOptions::default().with_api_host("ftp://example.com");
        assert!(matches!(options.validate(), Err(Error::Config(_))));

        let options = ClientOptions::default().with_api_host("not a url");
        assert!(matches!(options.validate(), Err(Error::Url(_))));
    }

    #[test]
    fn test_validate_rejects_blank_session_key() {
        let options = ClientOptions::default().with_session_key("  ");
        assert!(options.validate().is_err());
    }
}
