//! Route gating for protected views

use tokio::sync::watch;

use super::{Auth, AuthState, Session};

/// What a protected view should show
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    /// Validation still in flight; show a placeholder
    Loading,
    /// Render the protected children for this session
    Render(Session),
    /// Navigate to the login route
    Redirect(String),
}

/// Gate wrapping one protected subtree
///
/// The decision is taken once per mount and cached until [`unmount`](Self::unmount),
/// so re-rendering the subtree does not re-check the session.
pub struct ProtectedRoute {
    state: watch::Receiver<AuthState>,
    login_route: String,
    resolved: Option<RouteDecision>,
}

impl ProtectedRoute {
    pub fn new(auth: &Auth) -> Self {
        Self {
            state: auth.subscribe(),
            login_route: auth.options().login_route.clone(),
            resolved: None,
        }
    }

    /// The cached decision, or `Loading` until the route is mounted
    pub fn decision(&self) -> RouteDecision {
        self.resolved.clone().unwrap_or(RouteDecision::Loading)
    }

    pub fn is_mounted(&self) -> bool {
        self.resolved.is_some()
    }

    /// Mount without waiting: resolves only if validation already finished
    pub fn try_mount(&mut self) -> RouteDecision {
        if self.resolved.is_none() {
            let state = self.state.borrow().clone();
            if state.is_resolved() {
                self.resolved = Some(self.decide(&state));
            }
        }
        self.decision()
    }

    /// Mount, waiting for any in-flight validation to settle
    pub async fn mount(&mut self) -> RouteDecision {
        if let Some(decision) = &self.resolved {
            return decision.clone();
        }

        let settled = self
            .state
            .wait_for(|state| state.is_resolved())
            .await
            .map(|state| (*state).clone());

        // A dropped session service can no longer vouch for anyone.
        let decision = match settled {
            Ok(state) => self.decide(&state),
            Err(_) => RouteDecision::Redirect(self.login_route.clone()),
        };

        self.resolved = Some(decision.clone());
        decision
    }

    /// Forget the cached decision; the next mount checks again
    pub fn unmount(&mut self) {
        self.resolved = None;
    }

    fn decide(&self, state: &AuthState) -> RouteDecision {
        match state.session() {
            Some(session) => RouteDecision::Render(session.clone()),
            None => RouteDecision::Redirect(self.login_route.clone()),
        }
    }
}
