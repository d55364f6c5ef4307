//! Session manager: who is signed in, reconciled between durable storage and
//! the API.
//!
//! DESIGN
//! ======
//! The current [`Session`] lives in a `tokio::sync::watch` channel. Readers
//! either take a [`SessionManager::snapshot`] or hold a receiver from
//! [`SessionManager::subscribe`] and react to changes. Every mutation writes
//! durable storage first and publishes the new session afterwards: a
//! subscriber never sees an authenticated session whose credentials are not
//! persisted yet.
//!
//! Startup restore is a small state machine ([`RestorePhase`]):
//!
//! ```text
//! Restore ──no cache──▶ Anonymous
//!    │
//!    ▼
//! Validate ──profile ok──▶ Confirmed
//!    │
//!    ▼
//! Refresh ──token ok──▶ Confirmed
//!    │
//!    ▼
//! Cleared
//! ```
//!
//! Every terminal phase leaves `is_loading == false`.

use shared::models::{AvatarUpdate, ProfileUpdate, RegisterRequest, User};
use std::{fmt, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::SessionError,
    gateway::AuthGateway,
    storage::{self, PersistedSession, SessionStore},
};

#[cfg(test)]
mod tests;

/// Snapshot of the authentication state.
///
/// `is_authenticated` implies both `user` and `access_token` are present.
#[derive(Clone, PartialEq, Eq)]
pub struct Session {
    user: Option<User>,
    access_token: Option<String>,
    refresh_token: Option<String>,
    is_loading: bool,
    is_authenticated: bool,
}

impl Session {
    /// Empty session of a process that has not restored anything yet.
    #[must_use]
    pub fn starting() -> Self {
        Self {
            is_loading: true,
            ..Self::signed_out()
        }
    }

    /// Nobody is signed in.
    #[must_use]
    pub fn signed_out() -> Self {
        Self {
            user: None,
            access_token: None,
            refresh_token: None,
            is_loading: false,
            is_authenticated: false,
        }
    }

    #[must_use]
    pub fn authenticated(user: User, access_token: String, refresh_token: Option<String>) -> Self {
        Self {
            user: Some(user),
            access_token: Some(access_token),
            refresh_token,
            is_loading: false,
            is_authenticated: true,
        }
    }

    /// Cached credentials shown while they are being validated.
    fn restoring(cached: PersistedSession) -> Self {
        Self {
            is_loading: true,
            ..Self::authenticated(cached.user, cached.access_token, cached.refresh_token)
        }
    }

    #[must_use]
    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// `true` while an auth operation or the startup restore is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.is_authenticated
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("user", &self.user.as_ref().map(|user| &user.id))
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("is_loading", &self.is_loading)
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// Steps of the startup restore.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RestorePhase {
    /// Reading cached credentials.
    Restore,
    /// Checking the cached access token against the profile endpoint.
    Validate,
    /// Validation failed; trying the refresh token once.
    Refresh,
    /// The session is authenticated and confirmed by the server.
    Confirmed,
    /// Validation and refresh both failed; the session was wiped.
    Cleared,
    /// Nothing usable was cached.
    Anonymous,
}

impl RestorePhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Confirmed | Self::Cleared | Self::Anonymous)
    }
}

/// Owner of the process-wide [`Session`].
pub struct SessionManager<G> {
    gateway: G,
    store: Arc<dyn SessionStore>,
    state: watch::Sender<Session>,
}

impl<G> fmt::Debug for SessionManager<G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("session", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<G: AuthGateway> SessionManager<G> {
    /// Create a manager in the [`Session::starting`] state.
    ///
    /// `store` must be the same store the gateway reads credentials from.
    pub fn new(gateway: G, store: Arc<dyn SessionStore>) -> Self {
        let (state, _) = watch::channel(Session::starting());
        Self {
            gateway,
            store,
            state,
        }
    }

    /// Current session.
    pub fn snapshot(&self) -> Session {
        self.state.borrow().clone()
    }

    /// Receiver notified on every session change.
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.state.subscribe()
    }

    pub fn gateway(&self) -> &G {
        &self.gateway
    }

    /// Restore the cached session and reconcile it with the server.
    #[instrument(skip(self))]
    pub async fn initialize(&self) -> RestorePhase {
        let mut phase = RestorePhase::Restore;
        loop {
            debug!(?phase, "session restore step");
            phase = match phase {
                RestorePhase::Restore => self.restore_cached(),
                RestorePhase::Validate => self.validate_cached().await,
                RestorePhase::Refresh => self.refresh_cached().await,
                terminal => {
                    info!(phase = ?terminal, "session restore finished");
                    return terminal;
                }
            };
        }
    }

    fn restore_cached(&self) -> RestorePhase {
        if let Some(cached) = PersistedSession::load(self.store.as_ref()) {
            debug!(user_id = %cached.user.id, "restored cached session");
            self.state.send_replace(Session::restoring(cached));
            RestorePhase::Validate
        } else {
            self.state.send_replace(Session::signed_out());
            RestorePhase::Anonymous
        }
    }

    async fn validate_cached(&self) -> RestorePhase {
        match self.gateway.get_user_profile().await {
            Ok(user) => {
                if let Err(err) = storage::persist_user(self.store.as_ref(), &user) {
                    warn!(error = %err, "failed to persist validated user");
                }
                self.state.send_modify(|session| {
                    session.user = Some(user);
                    session.is_loading = false;
                });
                RestorePhase::Confirmed
            }
            Err(err) => {
                warn!(error = %err, "cached session failed validation");
                RestorePhase::Refresh
            }
        }
    }

    async fn refresh_cached(&self) -> RestorePhase {
        match self.refresh_token().await {
            Ok(()) => {
                self.state.send_modify(|session| session.is_loading = false);
                RestorePhase::Confirmed
            }
            Err(_) => RestorePhase::Cleared,
        }
    }

    /// Sign in and persist the returned credentials.
    ///
    /// A failed login leaves any existing session as it was.
    ///
    /// # Errors
    /// Fails on missing input, a gateway failure, or a storage failure.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, SessionError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }

        let previous = self.snapshot();
        self.set_loading(true);

        let credentials = match self.gateway.login(email, password).await {
            Ok(credentials) => credentials,
            Err(err) => {
                warn!(error = %err, "login failed");
                self.set_loading(false);
                return Err(err.into());
            }
        };

        if let Err(err) = storage::persist_login(
            self.store.as_ref(),
            &credentials.user,
            &credentials.access_token,
            &credentials.refresh_token,
        ) {
            warn!(error = %err, "failed to persist login; keeping previous session");
            self.rewrite_storage(&previous);
            self.set_loading(false);
            return Err(err.into());
        }

        info!(user_id = %credentials.user.id, role = %credentials.user.role, "signed in");
        let user = credentials.user.clone();
        self.state.send_replace(Session::authenticated(
            credentials.user,
            credentials.access_token,
            Some(credentials.refresh_token),
        ));
        Ok(user)
    }

    /// Create an account without signing in.
    ///
    /// # Errors
    /// Fails on missing input, a password/confirmation mismatch, or a
    /// gateway failure.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn register(&self, request: &RegisterRequest) -> Result<Option<User>, SessionError> {
        if request.email.trim().is_empty() || request.password.is_empty() {
            return Err(SessionError::MissingCredentials);
        }
        if request.password != request.confirm_password {
            return Err(SessionError::PasswordMismatch);
        }

        self.set_loading(true);
        let result = self.gateway.register(request).await;
        self.set_loading(false);

        match result {
            Ok(user) => {
                info!("account registered");
                Ok(user)
            }
            Err(err) => {
                warn!(error = %err, "registration failed");
                Err(err.into())
            }
        }
    }

    /// Sign out. The local session is always cleared; a failing remote
    /// logout is only logged.
    ///
    /// # Errors
    /// Returns an error only if durable storage could not be emptied. The
    /// in-memory session is cleared either way.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), SessionError> {
        self.set_loading(true);
        if let Err(err) = self.gateway.logout().await {
            warn!(error = %err, "remote logout failed; clearing local session anyway");
        }
        let cleared = storage::clear(self.store.as_ref());
        self.state.send_replace(Session::signed_out());
        info!("signed out");
        cleared.map_err(SessionError::from)
    }

    /// Exchange the refresh token for a new access token.
    ///
    /// Any failure wipes the whole session before the error is returned.
    ///
    /// # Errors
    /// Fails when no refresh token is held, the gateway refuses, or the new
    /// token cannot be persisted.
    #[instrument(skip(self))]
    pub async fn refresh_token(&self) -> Result<(), SessionError> {
        match self.try_refresh().await {
            Ok(()) => Ok(()),
            Err(err) => {
                warn!(error = %err, "token refresh failed; clearing session");
                self.clear_session();
                Err(err)
            }
        }
    }

    async fn try_refresh(&self) -> Result<(), SessionError> {
        let has_refresh_token = self.state.borrow().refresh_token.is_some();
        if !has_refresh_token {
            return Err(SessionError::MissingRefreshToken);
        }
        let token = self.gateway.refresh_token().await?;
        storage::persist_access_token(self.store.as_ref(), &token)?;
        self.state
            .send_modify(|session| session.access_token = Some(token));
        debug!("access token refreshed");
        Ok(())
    }

    /// Change name and/or email. Tokens are left untouched.
    ///
    /// # Errors
    /// Fails on a gateway or storage failure; the session is unchanged then.
    #[instrument(skip(self, update))]
    pub async fn update_profile(&self, update: &ProfileUpdate) -> Result<User, SessionError> {
        let user = self.gateway.update_user_profile(update).await?;
        self.replace_user(user)
    }

    /// Replace the avatar with a base64 data URL.
    ///
    /// # Errors
    /// Fails on a gateway or storage failure; the session is unchanged then.
    #[instrument(skip(self, update))]
    pub async fn update_avatar(&self, update: &AvatarUpdate) -> Result<User, SessionError> {
        let user = self.gateway.update_avatar(update).await?;
        self.replace_user(user)
    }

    fn replace_user(&self, user: User) -> Result<User, SessionError> {
        storage::persist_user(self.store.as_ref(), &user)?;
        debug!(user_id = %user.id, "user record replaced");
        self.state
            .send_modify(|session| session.user = Some(user.clone()));
        Ok(user)
    }

    fn set_loading(&self, loading: bool) {
        self.state.send_if_modified(|session| {
            let changed = session.is_loading != loading;
            session.is_loading = loading;
            changed
        });
    }

    fn clear_session(&self) {
        if let Err(err) = storage::clear(self.store.as_ref()) {
            warn!(error = %err, "failed to clear stored session");
        }
        self.state.send_replace(Session::signed_out());
    }

    /// Put durable storage back in line with `session`.
    fn rewrite_storage(&self, session: &Session) {
        let store = self.store.as_ref();
        let result = match (&session.user, &session.access_token) {
            (Some(user), Some(access_token)) if session.is_authenticated => {
                match &session.refresh_token {
                    Some(refresh_token) => {
                        storage::persist_login(store, user, access_token, refresh_token)
                    }
                    None => storage::persist_access_token(store, access_token)
                        .and_then(|()| store.remove(storage::REFRESH_TOKEN_KEY))
                        .and_then(|()| storage::persist_user(store, user)),
                }
            }
            _ => storage::clear(store),
        };
        if let Err(err) = result {
            warn!(error = %err, "failed to restore stored session");
        }
    }
}
