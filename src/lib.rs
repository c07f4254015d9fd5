//! Shopfloor Rust Client Library
//!
//! A Rust client for the shopfloor management API: session handling with
//! route gating, production-order sequencing, the back-office resource
//! collections and the monthly dashboard.

pub mod auth;
pub mod config;
pub mod dashboard;
pub mod dates;
pub mod error;
pub mod fetch;
pub mod resources;
pub mod sequencing;

use std::sync::Arc;

use reqwest::Client;
use tracing::debug;

use crate::auth::{Auth, FileStore, MemoryStore, ProtectedRoute, SessionStore};
use crate::config::ClientOptions;
use crate::dashboard::DashboardClient;
use crate::error::Result;
use crate::fetch::Api;
use crate::resources::{Customer, Employee, Expense, Goal, Payroll, ResourceClient, UserAccount};
use crate::sequencing::{Product, SequencingClient, SequencingView};

/// The main entry point for the shopfloor client
pub struct Shopfloor {
    /// HTTP client shared by every request
    pub http_client: Client,
    /// Session service for login, logout and restore
    pub auth: Arc<Auth>,
    /// Client options
    pub options: ClientOptions,
}

impl Shopfloor {
    /// Create a new client for an API host
    ///
    /// # Example
    ///
    /// ```
    /// use shopfloor_client::Shopfloor;
    ///
    /// let shopfloor = Shopfloor::new("http://localhost:8050/api").unwrap();
    /// ```
    pub fn new(api_host: &str) -> Result<Self> {
        Self::new_with_options(ClientOptions::default().with_api_host(api_host))
    }

    /// Create a new client with custom options
    ///
    /// The session is kept on disk when `storage_dir` is set, in memory otherwise.
    ///
    /// # Example
    ///
    /// ```
    /// use shopfloor_client::{Shopfloor, config::ClientOptions};
    ///
    /// let options = ClientOptions::default()
    ///     .with_api_host("http://localhost:8050/api")
    ///     .with_persist_session(false);
    /// let shopfloor = Shopfloor::new_with_options(options).unwrap();
    /// ```
    pub fn new_with_options(options: ClientOptions) -> Result<Self> {
        let store: Arc<dyn SessionStore> = match &options.storage_dir {
            Some(dir) => Arc::new(FileStore::new(dir.clone())),
            None => Arc::new(MemoryStore::new()),
        };
        Self::new_with_store(options, store)
    }

    /// Create a new client backed by a caller supplied session store
    pub fn new_with_store(options: ClientOptions, store: Arc<dyn SessionStore>) -> Result<Self> {
        options.validate()?;

        let mut builder = Client::builder();
        if let Some(timeout) = options.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder.build()?;

        debug!(api_host = %options.api_host, persist = options.persist_session, "creating client");
        let auth = Arc::new(Auth::new(http_client.clone(), store, options.clone()));

        Ok(Self {
            http_client,
            auth,
            options,
        })
    }

    /// Create a new client configured from `SHOPFLOOR_*` environment variables
    pub fn from_env() -> Result<Self> {
        Self::new_with_options(ClientOptions::from_env()?)
    }

    /// Get a reference to the session service
    pub fn auth(&self) -> &Auth {
        &self.auth
    }

    /// Authenticated request helper for endpoints without a dedicated client
    pub fn api(&self) -> Api {
        Api::new(self.http_client.clone(), self.auth.clone())
    }

    /// Gate for one protected view
    pub fn protected_route(&self) -> ProtectedRoute {
        ProtectedRoute::new(&self.auth)
    }

    /// Client for the production queue endpoints
    pub fn sequencing(&self) -> SequencingClient {
        SequencingClient::new(self.api())
    }

    /// A fresh production-order screen; call `load` before using it
    pub fn sequencing_view(&self) -> SequencingView {
        SequencingView::new(self.sequencing())
    }

    pub fn customers(&self) -> ResourceClient<Customer> {
        ResourceClient::new(self.api())
    }

    pub fn employees(&self) -> ResourceClient<Employee> {
        ResourceClient::new(self.api())
    }

    pub fn expenses(&self) -> ResourceClient<Expense> {
        ResourceClient::new(self.api())
    }

    pub fn payrolls(&self) -> ResourceClient<Payroll> {
        ResourceClient::new(self.api())
    }

    pub fn goals(&self) -> ResourceClient<Goal> {
        ResourceClient::new(self.api())
    }

    pub fn products(&self) -> ResourceClient<Product> {
        ResourceClient::new(self.api())
    }

    /// User accounts; the server only lets admins manage these
    pub fn users(&self) -> ResourceClient<UserAccount> {
        ResourceClient::new(self.api())
    }

    pub fn dashboard(&self) -> DashboardClient {
        DashboardClient::new(self.api())
    }
}

/// A convenience module for common imports
pub mod prelude {
    pub use crate::auth::{AuthState, Credentials, ProtectedRoute, Role, RouteDecision, Session};
    pub use crate::config::ClientOptions;
    pub use crate::error::{Error, Result};
    pub use crate::sequencing::{Priority, Product, ProductStatus, SequencingView};
    pub use crate::Shopfloor;
}
