//! Process-wide authentication state.
//!
//! [`SessionProvider`] is constructed explicitly and shared as an `Arc`.
//! Renderers follow the latest [`SessionSnapshot`] through [`SessionProvider::subscribe`];
//! owners of per-user data listen to [`SessionEvent`]s and drop that data on sign-out.

use std::sync::Arc;

use shared::{
    domain::UserIdentity,
    protocol::{PasswordCredentials, SignUpResponse},
};
use tokio::sync::{broadcast, watch};
use tracing::{info, warn};

use crate::{AuthBackend, BackendError};

const SESSION_EVENT_CAPACITY: usize = 16;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub user: Option<UserIdentity>,
    pub loading: bool,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            user: None,
            loading: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    SignedIn(UserIdentity),
    SignedOut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignUpOutcome {
    SignedIn(UserIdentity),
    /// The account exists but has to be confirmed by email before signing in.
    ConfirmationPending { email: Option<String> },
}

pub struct SessionProvider {
    auth: Arc<dyn AuthBackend>,
    state: watch::Sender<SessionSnapshot>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionProvider {
    pub fn new(auth: Arc<dyn AuthBackend>) -> Arc<Self> {
        let (state, _) = watch::channel(SessionSnapshot::default());
        let (events, _) = broadcast::channel(SESSION_EVENT_CAPACITY);
        Arc::new(Self {
            auth,
            state,
            events,
        })
    }

    /// Resolves the initial user from the auth backend and clears `loading`.
    pub async fn initialize(&self) {
        let user = match self.auth.current_session().await {
            Ok(session) => session.map(|session| session.user),
            Err(err) => {
                warn!(error = %err, "failed to resolve initial session; starting signed out");
                None
            }
        };

        self.state.send_replace(SessionSnapshot {
            user: user.clone(),
            loading: false,
        });
        if let Some(user) = user {
            info!(user_id = %user.id, "restored session");
            let _ = self.events.send(SessionEvent::SignedIn(user));
        }
    }

    pub async fn sign_in(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<UserIdentity, BackendError> {
        match self.auth.sign_in_with_password(credentials).await {
            Ok(session) => {
                self.establish(session.user.clone());
                Ok(session.user)
            }
            Err(err) => {
                warn!(email = %credentials.email, error = %err, "sign-in rejected");
                Err(err)
            }
        }
    }

    pub async fn sign_up(
        &self,
        credentials: &PasswordCredentials,
    ) -> Result<SignUpOutcome, BackendError> {
        match self.auth.sign_up(credentials).await? {
            SignUpResponse::Session(session) => {
                self.establish(session.user.clone());
                Ok(SignUpOutcome::SignedIn(session.user))
            }
            SignUpResponse::PendingConfirmation(user) => {
                info!(user_id = %user.id, "sign-up awaiting email confirmation");
                Ok(SignUpOutcome::ConfirmationPending { email: user.email })
            }
        }
    }

    /// Clears the local session even if the remote logout fails; that failure
    /// is still returned to the caller.
    pub async fn sign_out(&self) -> Result<(), BackendError> {
        let result = self.auth.sign_out().await;

        let previous = self.state.borrow().user.clone();
        self.state.send_modify(|state| {
            state.user = None;
            state.loading = false;
        });
        if let Some(user) = previous {
            info!(user_id = %user.id, "signed out");
            let _ = self.events.send(SessionEvent::SignedOut);
        }

        if let Err(err) = &result {
            warn!(error = %err, "remote sign-out failed; local session cleared anyway");
        }
        result
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.state.borrow().user.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.subscribe()
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    fn establish(&self, user: UserIdentity) {
        self.state.send_replace(SessionSnapshot {
            user: Some(user.clone()),
            loading: false,
        });
        info!(user_id = %user.id, "signed in");
        let _ = self.events.send(SessionEvent::SignedIn(user));
    }
}

#[cfg(test)]
#[path = "tests/session_tests.rs"]
mod tests;
