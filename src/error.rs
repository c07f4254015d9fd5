//! Error handling for the shopfloor client

use std::fmt;
use thiserror::Error;

/// Unified error type for the shopfloor client
#[derive(Error, Debug)]
pub enum Error {
    /// Bad credentials; the caller should prompt again
    #[error("Authentication error: {0}")]
    Authentication(String),

    /// The stored token is missing, stale or was rejected by the server
    #[error("Session invalid: {0}")]
    SessionInvalid(String),

    /// Network or HTTP transport errors
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The server answered with a non-success status
    #[error("API error: {message} (Status: {status})")]
    Api {
        status: reqwest::StatusCode,
        message: String,
    },

    /// Client-side checks that block a submission
    #[error("Validation error: {0}")]
    Validation(String),

    /// A product id that is not on the sequencing board
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// JSON serialization or deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing errors
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// Session storage errors
    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    /// Invalid client configuration
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a new authentication error
    pub fn authentication<T: fmt::Display>(msg: T) -> Self {
        Error::Authentication(msg.to_string())
    }

    /// Create a new session invalid error
    pub fn session_invalid<T: fmt::Display>(msg: T) -> Self {
        Error::SessionInvalid(msg.to_string())
    }

    /// Create a new validation error
    pub fn validation<T: fmt::Display>(msg: T) -> Self {
        Error::Validation(msg.to_string())
    }

    /// Create a new configuration error
    pub fn config<T: fmt::Display>(msg: T) -> Self {
        Error::Config(msg.to_string())
    }

    /// Whether retrying the same action later may succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Error::Network(_) => true,
            Error::Api { status, .. } => status.is_server_error(),
            _ => false,
        }
    }

    /// Whether the error ends the current session
    pub fn forces_logout(&self) -> bool {
        matches!(self, Error::SessionInvalid(_))
    }
}

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;
