//! Session handling and route gating
//!
//! [`Auth`] is the single owner of the authenticated identity. It persists the
//! session through a [`SessionStore`], validates a restored session against the
//! server before trusting it, and publishes every transition on a watch channel
//! that [`ProtectedRoute`] and the request helpers read from.

mod guard;
mod session;
mod store;
mod types;

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use reqwest::Client;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::config::ClientOptions;
use crate::error::{Error, Result};
use crate::fetch::{error_message, Fetch};

pub use guard::*;
pub use session::*;
pub use store::*;
pub use types::*;

/// Where the session lifecycle currently stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    /// Nothing has been read from storage yet
    Uninitialized,
    /// A stored session is being checked against the server
    Validating,
    Authenticated(Session),
    LoggedOut,
}

impl AuthState {
    /// Whether protected views can be decided on
    pub fn is_resolved(&self) -> bool {
        matches!(self, AuthState::Authenticated(_) | AuthState::LoggedOut)
    }

    pub fn session(&self) -> Option<&Session> {
        match self {
            AuthState::Authenticated(session) => Some(session),
            _ => None,
        }
    }
}

/// Session service shared by every authenticated client
pub struct Auth {
    client: Client,
    store: Arc<dyn SessionStore>,
    options: ClientOptions,
    state: watch::Sender<AuthState>,
    /// Bumped by login and logout so an in-flight validation cannot overwrite them
    epoch: AtomicU64,
}

impl Auth {
    /// Create a new session service
    pub fn new(client: Client, store: Arc<dyn SessionStore>, options: ClientOptions) -> Self {
        let (state, _) = watch::channel(AuthState::Uninitialized);

        Self {
            client,
            store,
            options,
            state,
            epoch: AtomicU64::new(0),
        }
    }

    pub fn options(&self) -> &ClientOptions {
        &self.options
    }

    /// Snapshot of the current state
    pub fn state(&self) -> AuthState {
        self.state.borrow().clone()
    }

    /// Receiver that observes every state transition
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// The session snapshot, if authenticated
    pub fn current_session(&self) -> Option<Session> {
        self.state.borrow().session().cloned()
    }

    pub fn is_authenticated(&self) -> bool {
        self.current_session().is_some()
    }

    /// Restore the persisted session at startup
    ///
    /// A stored session is only trusted after the liveness check succeeds. Any
    /// failure of that check, network errors included, clears storage and ends
    /// in [`AuthState::LoggedOut`].
    pub async fn restore(&self) -> AuthState {
        let epoch = self.epoch.load(Ordering::SeqCst);

        let stored = match self.load_stored().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!(error = %e, "stored session is unreadable, discarding it");
                if self.transition_if_current(epoch, AuthState::LoggedOut) {
                    self.clear_storage().await;
                }
                return self.state();
            }
        };

        let Some(session) = stored else {
            debug!("no stored session");
            self.transition_if_current(epoch, AuthState::LoggedOut);
            return self.state();
        };

        if !self.transition_if_current(epoch, AuthState::Validating) {
            return self.state();
        }

        match self.ping_with(&session.token).await {
            Ok(()) => {
                let username = session.username.clone();
                if self.transition_if_current(epoch, AuthState::Authenticated(session)) {
                    info!(user = %username, "restored session");
                }
            }
            Err(e) => {
                warn!(error = %e, user = %session.username, "stored session failed the liveness check");
                if self.transition_if_current(epoch, AuthState::LoggedOut) {
                    self.clear_storage().await;
                }
            }
        }

        self.state()
    }

    /// Log in with username and password
    ///
    /// When a session is already held this is a no-op returning it. On any
    /// failure the current state is left untouched.
    pub async fn login(&self, credentials: &Credentials) -> Result<Session> {
        credentials.validate()?;

        if let Some(session) = self.current_session() {
            debug!(user = %session.username, "login requested while authenticated");
            return Ok(session);
        }

        let url = self.options.endpoint(&self.options.login_path);
        let response = Fetch::post(&self.client, &url)
            .json(credentials)?
            .execute_raw()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status, &text);
            warn!(user = %credentials.username, %status, "login rejected");
            return Err(Error::Authentication(message));
        }

        let payload: LoginResponse = serde_json::from_str(&text)
            .map_err(|e| Error::authentication(format!("unreadable login response: {}", e)))?;
        let session = payload.into_session()?;

        self.persist(&session).await?;
        self.transition(AuthState::Authenticated(session.clone()));

        info!(user = %session.username, role = ?session.role, "logged in");
        Ok(session)
    }

    /// Clear the session from memory and storage; always succeeds
    pub async fn logout(&self) {
        self.transition(AuthState::LoggedOut);
        self.clear_storage().await;
        info!("logged out");
    }

    /// End the session because the server stopped accepting its token
    pub async fn invalidate(&self, reason: &str) {
        warn!(%reason, "session invalidated");
        self.transition(AuthState::LoggedOut);
        self.clear_storage().await;
    }

    /// End the session only if it still holds `token`
    ///
    /// A request sent before a logout and re-login must not end the newer
    /// session. Returns whether a session was ended.
    pub async fn invalidate_token(&self, token: &str, reason: &str) -> bool {
        let ended = self.state.send_if_modified(|state| {
            if state.session().map(|s| s.token.as_str()) != Some(token) {
                return false;
            }
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = AuthState::LoggedOut;
            true
        });

        if ended {
            warn!(%reason, "session invalidated");
            self.clear_storage().await;
        } else {
            debug!(%reason, "rejected token is no longer current, keeping session");
        }
        ended
    }

    /// Liveness check for the held session; a 401 logs out
    pub async fn ping(&self) -> Result<()> {
        let url = self.options.endpoint(&self.options.ping_path);
        Fetch::get(&self.client, &url)
            .authorized(self)
            .execute_unit()
            .await
    }

    async fn ping_with(&self, token: &str) -> Result<()> {
        let url = self.options.endpoint(&self.options.ping_path);
        Fetch::get(&self.client, &url)
            .bearer_auth(token)
            .execute_unit()
            .await
    }

    async fn load_stored(&self) -> Result<Option<Session>> {
        if !self.options.persist_session {
            return Ok(None);
        }

        match self.store.read(&self.options.session_key).await? {
            Some(raw) => Ok(Some(serde_json::from_str(&raw)?)),
            None => Ok(None),
        }
    }

    async fn persist(&self, session: &Session) -> Result<()> {
        if !self.options.persist_session {
            return Ok(());
        }

        let raw = serde_json::to_string(session)?;
        self.store.write(&self.options.session_key, &raw).await
    }

    async fn clear_storage(&self) {
        if let Err(e) = self.store.remove(&self.options.session_key).await {
            warn!(error = %e, "failed to clear stored session");
        }
    }

    fn transition(&self, next: AuthState) {
        self.state.send_modify(|state| {
            self.epoch.fetch_add(1, Ordering::SeqCst);
            *state = next;
        });
    }

    fn transition_if_current(&self, epoch: u64, next: AuthState) -> bool {
        self.state.send_if_modified(|state| {
            if self.epoch.load(Ordering::SeqCst) != epoch {
                return false;
            }
            *state = next;
            true
        })
    }
}
