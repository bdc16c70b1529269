//! Session state shared by every consumer of the auth feature. A manager is
//! only obtainable through [`SessionManager::initialize`], which restores any
//! persisted session before returning, so no consumer can observe a session
//! that has not been hydrated yet.
//!
//! Operations are not serialized: when two of them overlap, whichever settles
//! last determines the final state.

use super::{
    api::AuthApi,
    error::{ApiError, SessionError},
    store::TokenStore,
    types::{AuthResponse, User},
};
use secrecy::SecretString;
use std::{fmt, sync::Arc};
use tokio::sync::watch;
use tracing::{debug, error, info, instrument, warn};

const LOGIN_FAILED: &str = "Login failed";
const REGISTRATION_FAILED: &str = "Registration failed";

struct Inner<S, A> {
    store: S,
    api: A,
    user: watch::Sender<Option<User>>,
}

/// Cloneable handle to a single session.
pub struct SessionManager<S, A> {
    inner: Arc<Inner<S, A>>,
}

impl<S, A> Clone for SessionManager<S, A> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S, A> fmt::Debug for SessionManager<S, A> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        let user = self.inner.user.borrow();
        formatter
            .debug_struct("SessionManager")
            .field("user", &*user)
            .field("is_authenticated", &user.is_some())
            .finish_non_exhaustive()
    }
}

impl<S: TokenStore, A: AuthApi> SessionManager<S, A> {
    /// Builds the session and restores it from the persisted token, if any.
    ///
    /// Restoration never fails from the caller's point of view: an unreadable
    /// store or a token the API does not accept both yield a logged-out session
    /// and the persisted entry is cleared.
    #[instrument(skip_all)]
    pub async fn initialize(store: S, api: A) -> Self {
        let (user, _) = watch::channel(None);
        let manager = Self {
            inner: Arc::new(Inner { store, api, user }),
        };

        match manager.inner.store.get() {
            Ok(Some(token)) => manager.restore_session(&token).await,
            Ok(None) => debug!("no persisted token"),
            Err(err) => {
                warn!("failed to read persisted token: {err}");
                if let Err(err) = manager.inner.store.remove() {
                    error!("failed to remove persisted token: {err}");
                }
            }
        }

        manager
    }

    /// Fail-closed: any error from `me` discards the persisted token.
    async fn restore_session(&self, token: &SecretString) {
        match self.inner.api.me(token).await {
            Ok(user) => {
                info!(user_id = %user.id, "session restored");
                self.inner.user.send_replace(Some(user));
            }
            Err(err) => {
                warn!("session restoration failed: {err}");
                if let Err(err) = self.inner.store.remove() {
                    error!("failed to remove persisted token: {err}");
                }
                self.inner.user.send_replace(None);
            }
        }
    }

    /// Authenticates with email and password and persists the returned token.
    ///
    /// # Errors
    /// Returns `SessionError::Auth` when the server rejects the credentials,
    /// `SessionError::Api` for transport or decoding failures, and
    /// `SessionError::Store` if the token cannot be persisted. The current
    /// session is left untouched on error.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &SecretString) -> Result<(), SessionError> {
        let response = self
            .inner
            .api
            .login(email, password)
            .await
            .map_err(|err| rejection(err, LOGIN_FAILED))?;

        self.establish(response)
    }

    /// Creates an account and signs into it.
    ///
    /// # Errors
    /// Same as [`SessionManager::login`].
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<(), SessionError> {
        let response = self
            .inner
            .api
            .register(name, email, password)
            .await
            .map_err(|err| rejection(err, REGISTRATION_FAILED))?;

        self.establish(response)
    }

    /// Clears the local session. The server is not contacted.
    #[instrument(skip(self))]
    pub fn logout(&self) {
        if let Err(err) = self.inner.store.remove() {
            error!("failed to remove persisted token: {err}");
        }
        self.inner.user.send_replace(None);

        info!("logged out");
    }

    fn establish(&self, response: AuthResponse) -> Result<(), SessionError> {
        let AuthResponse { token, user } = response;
        self.inner.store.set(&token)?;

        info!(user_id = %user.id, "session established");
        self.inner.user.send_replace(Some(user));

        Ok(())
    }
}

impl<S, A> SessionManager<S, A> {
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.inner.user.borrow().clone()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.user.borrow().is_some()
    }

    /// Receiver notified on every session change, for consumers that re-render.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<User>> {
        self.inner.user.subscribe()
    }
}

fn rejection(err: ApiError, fallback: &str) -> SessionError {
    match err {
        ApiError::Rejected { message, .. } => SessionError::Auth(
            message
                .filter(|message| !message.is_empty())
                .unwrap_or_else(|| fallback.to_string()),
        ),
        other => SessionError::Api(other),
    }
}
