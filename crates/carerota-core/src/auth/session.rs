use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::TokenStore;
use crate::models::{Organization, Profile, StaffType, User};

/// Everything the client knows about the signed-in user.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub token: Option<String>,
    pub user: Option<User>,
    pub current_organization: Option<Organization>,
    #[serde(default)]
    pub permissions: Vec<String>,
    pub staff_type: Option<StaffType>,
}

impl SessionState {
    /// Authenticated exactly when a token is held.
    pub fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.iter().any(|p| p == permission || p == "*")
    }

    pub fn organization_id(&self) -> Option<&str> {
        self.current_organization.as_ref().map(|org| org.id.as_str())
    }
}

impl fmt::Debug for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionState")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("user", &self.user.as_ref().map(|u| u.id.as_str()))
            .field("current_organization", &self.organization_id())
            .field("permissions", &self.permissions)
            .field("staff_type", &self.staff_type)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub enum SessionAction {
    /// A login (or token refresh) succeeded.
    CredentialsSet { token: String, user: Option<User> },
    ProfileLoaded(Profile),
    OrganizationSwitched(Organization),
    /// Logout or 401.
    CredentialsCleared,
}

/// Pure transition function.
///
/// Profile and organization updates are ignored while signed out, so a
/// late profile response cannot resurrect a torn-down session.
pub fn reduce(state: &SessionState, action: SessionAction) -> SessionState {
    match action {
        SessionAction::CredentialsSet { token, user } => SessionState {
            token: Some(token),
            user,
            ..SessionState::default()
        },
        SessionAction::ProfileLoaded(profile) if state.is_authenticated() => SessionState {
            token: state.token.clone(),
            user: Some(profile.user),
            current_organization: profile.current_organization,
            permissions: profile.permissions,
            staff_type: profile.staff_type,
        },
        SessionAction::OrganizationSwitched(org) if state.is_authenticated() => SessionState {
            current_organization: Some(org),
            ..state.clone()
        },
        SessionAction::ProfileLoaded(_) | SessionAction::OrganizationSwitched(_) => state.clone(),
        SessionAction::CredentialsCleared => SessionState::default(),
    }
}

type CredentialsListener = Arc<dyn Fn(&SessionState) + Send + Sync>;

struct SessionInner {
    state: watch::Sender<SessionState>,
    persistence: Box<dyn TokenStore>,
    listeners: Mutex<Vec<CredentialsListener>>,
}

/// Shared session holder. Clone is cheap; every clone sees the same state.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<SessionInner>,
}

impl SessionStore {
    /// Start signed out, persisting future changes to `persistence`.
    pub fn new(persistence: Box<dyn TokenStore>) -> Self {
        Self::with_state(SessionState::default(), persistence)
    }

    /// Resume whatever session `persistence` holds.
    pub fn restore(persistence: Box<dyn TokenStore>) -> Self {
        let state = match persistence.load() {
            Ok(Some(state)) => {
                debug!(authenticated = state.is_authenticated(), "Session restored");
                state
            }
            Ok(None) => SessionState::default(),
            Err(e) => {
                warn!(error = %e, "Failed to restore session, starting signed out");
                SessionState::default()
            }
        };
        Self::with_state(state, persistence)
    }

    fn with_state(state: SessionState, persistence: Box<dyn TokenStore>) -> Self {
        let (tx, _rx) = watch::channel(state);
        Self {
            inner: Arc::new(SessionInner {
                state: tx,
                persistence,
                listeners: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.state.borrow().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.inner.state.borrow().token.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Receiver that observes every state change.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.inner.state.subscribe()
    }

    /// Run `listener` synchronously whenever the token changes: on login,
    /// logout and on a 401 teardown. It is called after the new state is
    /// visible and persisted, before `dispatch` returns.
    pub fn on_credentials_changed(&self, listener: impl Fn(&SessionState) + Send + Sync + 'static) {
        self.inner
            .listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    /// Apply an action, persist the result and notify observers.
    pub fn dispatch(&self, action: SessionAction) -> SessionState {
        let mut credentials_changed = false;
        self.inner.state.send_modify(|state| {
            let next = reduce(state, action);
            credentials_changed = next.token != state.token;
            *state = next;
        });
        let next = self.state();
        self.persist(&next);

        if credentials_changed {
            // Listeners may dispatch again; do not hold the lock while calling them
            let listeners = self
                .inner
                .listeners
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone();
            debug!(authenticated = next.is_authenticated(), listeners = listeners.len(), "Credentials changed");
            for listener in &listeners {
                listener(&next);
            }
        }
        next
    }

    /// End the session and remove the persisted token.
    pub fn teardown(&self) {
        if self.is_authenticated() {
            info!("Session ended");
        }
        self.dispatch(SessionAction::CredentialsCleared);
    }

    fn persist(&self, state: &SessionState) {
        let result = if state.is_authenticated() {
            self.inner.persistence.save(state)
        } else {
            self.inner.persistence.clear()
        };
        if let Err(e) = result {
            warn!(error = %e, "Failed to persist session");
        }
    }
}
