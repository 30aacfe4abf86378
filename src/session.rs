//! Session manager: the single source of truth for "who is signed in".
//!
//! ARCHITECTURE
//! ============
//! `SessionStore` is a cloneable handle over shared state. It owns the
//! bearer token and the profile snapshot, persists both through a
//! `SessionStorage`, and reconciles them with the backend through an
//! `AccountApi`. Consumers read snapshots (`session()`) or subscribe to a
//! `tokio::sync::watch` channel; nothing outside this module mutates them.
//!
//! STATE MACHINE
//! =============
//! `Verifying` is the undecided state: before `restore()` has run, while a
//! token is persisted but no usable profile is cached, and between token
//! persistence and profile fetch during login/signup. `Authenticated`
//! always carries a user; `Unauthenticated` never does.
//!
//! CONCURRENCY
//! ===========
//! Mutating operations (restore, login, signup, logout, and the commit step
//! of verify) run under one async lock. Every commit bumps a generation
//! counter; a verify whose generation is no longer current drops its result,
//! so a late profile response cannot revive a session that was logged out.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::types::{AuthResponse, Registration, UserProfile};
use crate::api::{AccountApi, ApiError, FaultClass};
use crate::storage::{SessionStorage, StorageError, TOKEN_KEY, USER_KEY};

const MISSING_TOKEN_MESSAGE: &str = "The server did not return a session token.";

// =============================================================================
// SESSION SNAPSHOT
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    Unauthenticated,
    Verifying,
    Authenticated,
}

impl SessionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Verifying => "verifying",
            Self::Authenticated => "authenticated",
        }
    }
}

/// Read-only snapshot of the session. The token is not part of it; callers
/// that make authenticated requests ask the store for it.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    status: SessionStatus,
    user: Option<UserProfile>,
}

impl Session {
    #[must_use]
    pub fn unauthenticated() -> Self {
        Self { status: SessionStatus::Unauthenticated, user: None }
    }

    #[must_use]
    pub fn verifying() -> Self {
        Self { status: SessionStatus::Verifying, user: None }
    }

    #[must_use]
    pub fn authenticated(user: UserProfile) -> Self {
        Self { status: SessionStatus::Authenticated, user: Some(user) }
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        self.user.as_ref()
    }

    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }
}

// =============================================================================
// OUTCOMES
// =============================================================================

/// Result of login/signup as shown to the user. Never an error type: every
/// failure is already a displayable message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthOutcome {
    Success { message: Option<String> },
    Failure { error: String },
}

impl AuthOutcome {
    #[must_use]
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failure { error } => Some(error),
            Self::Success { .. } => None,
        }
    }

    fn failure(error: impl Into<String>) -> Self {
        Self::Failure { error: error.into() }
    }
}

/// What a verification did to the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    /// Server confirmed the token; profile refreshed.
    Confirmed,
    /// Server unreachable; local session kept as is.
    Tolerated,
    /// Server refused the token; session cleared.
    Rejected,
    /// Another operation changed the session first; result dropped.
    Superseded,
    /// No token to verify.
    NoSession,
}

// =============================================================================
// STORE
// =============================================================================

/// Injectable session store. Clones share the same session.
#[derive(Clone)]
pub struct SessionStore {
    inner: Arc<Inner>,
}

struct Inner {
    api: Arc<dyn AccountApi>,
    storage: Arc<dyn SessionStorage>,
    state: watch::Sender<Session>,
    token: Mutex<Option<String>>,
    generation: AtomicU64,
    op_lock: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore")
            .field("session", &*self.inner.state.borrow())
            .field("generation", &self.generation())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// New store in the `Verifying` state; call [`restore`](Self::restore)
    /// to load whatever was persisted.
    #[must_use]
    pub fn new(api: Arc<dyn AccountApi>, storage: Arc<dyn SessionStorage>) -> Self {
        let (state, _) = watch::channel(Session::verifying());
        Self {
            inner: Arc::new(Inner {
                api,
                storage,
                state,
                token: Mutex::new(None),
                generation: AtomicU64::new(0),
                op_lock: tokio::sync::Mutex::new(()),
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.inner.state.borrow().status
    }

    /// Receiver that observes every published session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Current bearer token, if a session exists.
    #[must_use]
    pub fn token(&self) -> Option<String> {
        self.token_slot().clone()
    }

    /// Monotonic counter bumped by every session commit.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.inner.generation.load(Ordering::SeqCst)
    }

    // -------------------------------------------------------------------------
    // restore / verify
    // -------------------------------------------------------------------------

    /// Load the persisted session.
    ///
    /// With a token and a cached profile the session is `Authenticated`
    /// immediately and a background verification is started; its handle is
    /// returned. Without a token the session is `Unauthenticated` and no
    /// verification runs.
    pub async fn restore(&self) -> Option<JoinHandle<VerifyOutcome>> {
        let guard = self.inner.op_lock.lock().await;
        let generation = self.bump();

        let Some(token) = self.read_key(TOKEN_KEY).filter(|t| !t.trim().is_empty()) else {
            // A profile without a token is a leftover; drop it.
            self.clear_persisted();
            self.set_token(None);
            self.publish(Session::unauthenticated());
            tracing::debug!("no persisted session");
            return None;
        };

        let cached = self.read_key(USER_KEY).and_then(|raw| match serde_json::from_str::<UserProfile>(&raw) {
            Ok(profile) => Some(profile),
            Err(e) => {
                tracing::warn!(error = %e, "cached profile unreadable; verifying token");
                None
            }
        });

        self.set_token(Some(token));
        match cached {
            Some(profile) => {
                tracing::info!(user_id = %profile.id, "session restored from storage");
                self.publish(Session::authenticated(profile));
            }
            None => self.publish(Session::verifying()),
        }
        drop(guard);

        let store = self.clone();
        Some(tokio::spawn(async move { store.verify_as_of(generation).await }))
    }

    /// Reconcile the local session with the backend profile endpoint.
    pub async fn verify(&self) -> VerifyOutcome {
        let generation = self.generation();
        self.verify_as_of(generation).await
    }

    async fn verify_as_of(&self, generation: u64) -> VerifyOutcome {
        let Some(token) = self.token() else {
            return VerifyOutcome::NoSession;
        };

        let result = self.inner.api.fetch_profile(&token).await;

        let _guard = self.inner.op_lock.lock().await;
        if self.generation() != generation {
            tracing::debug!(generation, current = self.generation(), "stale verification dropped");
            return VerifyOutcome::Superseded;
        }

        match result {
            Ok(profile) => {
                self.bump();
                if let Err(e) = self.persist_profile(&profile) {
                    tracing::warn!(error = %e, "verified profile not persisted");
                }
                self.publish(Session::authenticated(profile));
                VerifyOutcome::Confirmed
            }
            Err(e) => match classify_verify_failure(&e) {
                FaultClass::Connectivity => {
                    tracing::warn!(error = %e, "profile check unreachable; keeping local session");
                    VerifyOutcome::Tolerated
                }
                FaultClass::Rejection => {
                    tracing::info!(error = %e, "session rejected by server; signing out");
                    self.bump();
                    self.clear_persisted();
                    self.set_token(None);
                    self.publish(Session::unauthenticated());
                    VerifyOutcome::Rejected
                }
            },
        }
    }

    // -------------------------------------------------------------------------
    // login / signup / logout
    // -------------------------------------------------------------------------

    /// Sign in as a doctor. Never fails past this boundary.
    pub async fn login(&self, email: &str, password: &str) -> AuthOutcome {
        let _guard = self.inner.op_lock.lock().await;
        match self.inner.api.login(email, password).await {
            Ok(response) => self.establish(response).await,
            Err(e) => {
                tracing::warn!(error = %e, "login failed");
                AuthOutcome::failure(e.user_message())
            }
        }
    }

    /// Register a new account and sign in with the returned token. The
    /// success outcome carries the server's confirmation message, if any.
    pub async fn signup(&self, registration: &Registration) -> AuthOutcome {
        let _guard = self.inner.op_lock.lock().await;
        match self.inner.api.signup(registration).await {
            Ok(response) => self.establish(response).await,
            Err(e) => {
                tracing::warn!(error = %e, "signup failed");
                AuthOutcome::failure(e.user_message())
            }
        }
    }

    /// Clear the session locally, then tell the backend (best effort).
    /// Works without a prior [`restore`](Self::restore): the persisted token
    /// is revoked directly.
    pub async fn logout(&self) {
        let _guard = self.inner.op_lock.lock().await;
        self.bump();
        let held = self.token_slot().take();
        let token = held.or_else(|| self.read_key(TOKEN_KEY).filter(|t| !t.trim().is_empty()));
        self.clear_persisted();
        self.publish(Session::unauthenticated());

        if let Some(token) = token {
            if let Err(e) = self.inner.api.logout(&token).await {
                tracing::warn!(error = %e, "logout call failed; local session cleared anyway");
            }
        }
        tracing::info!("signed out");
    }

    /// Feed back the failure of a service call made with `token`. A 401
    /// ends the session; other errors are the caller's to report. Returns
    /// whether the session was cleared.
    pub async fn on_api_error(&self, token: &str, error: &ApiError) -> bool {
        if !error.is_session_expired() {
            return false;
        }
        let _guard = self.inner.op_lock.lock().await;
        if self.token().as_deref() != Some(token) {
            tracing::debug!("401 for a replaced token ignored");
            return false;
        }
        tracing::info!(error = %error, "token rejected by service call; signing out");
        self.bump();
        self.clear_persisted();
        self.set_token(None);
        self.publish(Session::unauthenticated());
        true
    }

    /// Persist the token, then fetch and persist the profile. Caller holds
    /// the op lock.
    async fn establish(&self, response: AuthResponse) -> AuthOutcome {
        let Some(token) = response.token.filter(|t| !t.trim().is_empty()) else {
            return AuthOutcome::failure(MISSING_TOKEN_MESSAGE);
        };

        self.bump();
        // The previous user's profile must not outlive its token.
        if let Err(e) = self.inner.storage.remove(USER_KEY) {
            tracing::warn!(error = %e, "stale profile not cleared");
            return AuthOutcome::failure(format!("Could not save the session: {e}"));
        }
        if let Err(e) = self.inner.storage.set(TOKEN_KEY, &token) {
            tracing::warn!(error = %e, "token not persisted");
            return AuthOutcome::failure(format!("Could not save the session: {e}"));
        }
        self.set_token(Some(token.clone()));
        self.publish(Session::verifying());

        let profile = match self.inner.api.fetch_profile(&token).await {
            Ok(profile) => profile,
            Err(e) => {
                tracing::warn!(error = %e, "profile fetch after sign-in failed");
                self.abandon();
                return AuthOutcome::failure(e.user_message());
            }
        };

        if let Err(e) = self.persist_profile(&profile) {
            tracing::warn!(error = %e, "profile not persisted");
            self.abandon();
            return AuthOutcome::failure(format!("Could not save the session: {e}"));
        }

        tracing::info!(user_id = %profile.id, "signed in");
        self.publish(Session::authenticated(profile));
        AuthOutcome::Success { message: response.message }
    }

    // -------------------------------------------------------------------------
    // helpers
    // -------------------------------------------------------------------------

    fn abandon(&self) {
        self.clear_persisted();
        self.set_token(None);
        self.publish(Session::unauthenticated());
    }

    fn bump(&self) -> u64 {
        self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn publish(&self, session: Session) {
        tracing::debug!(status = ?session.status, "session changed");
        self.inner.state.send_replace(session);
    }

    fn token_slot(&self) -> std::sync::MutexGuard<'_, Option<String>> {
        self.inner.token.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_token(&self, token: Option<String>) {
        *self.token_slot() = token;
    }

    fn read_key(&self, key: &str) -> Option<String> {
        match self.inner.storage.get(key) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key, error = %e, "storage read failed");
                None
            }
        }
    }

    fn persist_profile(&self, profile: &UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(profile)?;
        self.inner.storage.set(USER_KEY, &raw)
    }

    fn clear_persisted(&self) {
        for key in [TOKEN_KEY, USER_KEY] {
            if let Err(e) = self.inner.storage.remove(key) {
                tracing::warn!(key, error = %e, "storage clear failed");
            }
        }
    }
}

/// Verification keeps the session only when the server was never reached;
/// any answer from the server other than a profile ends it.
#[must_use]
pub fn classify_verify_failure(error: &ApiError) -> FaultClass {
    error.fault_class()
}

#[cfg(test)]
#[path = "session_test.rs"]
mod tests;
