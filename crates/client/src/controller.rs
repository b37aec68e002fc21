//! Auth state controller: the lifecycle of the signed-in session.
//!
//! One controller is built at the application root and handed to whatever
//! needs it. Every public method absorbs failures into state; callers read
//! the outcome through [`AuthController::status`] and the predicates.
//!
//! ## Lifecycle
//!
//! - no token: `Unauthenticated`, no network calls
//! - token and a fresh cache entry: `Revalidating` with the cached data right
//!   away, then a background refetch replaces it
//! - token, no usable cache entry: `Loading` until the refetch completes
//!
//! A failed fetch always ends in `Unauthenticated`; nothing is retried.
//!
//! ## Superseded responses
//!
//! Each state change that starts or ends a session advances a generation
//! counter. A fetch remembers the generation it was issued under and its
//! result is dropped if the counter has moved on by the time it completes,
//! so a response that arrives after `logout()` can never sign the user back in.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use erpdash_auth::{PermissionCheck, PermissionCode, PermissionSnapshot, User};
use erpdash_core::Clock;

use crate::api::{ApiError, AuthApi, Credentials};
use crate::cache::SessionCache;
use crate::routes::{Navigator, Routes};
use crate::storage::KeyValueStorage;
use crate::token::TokenAccessor;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthStatus {
    #[default]
    Unauthenticated,
    /// Blocking fetch in flight; nothing to show yet.
    Loading,
    Authenticated,
    /// Authenticated with data on screen while a refetch is in flight.
    Revalidating,
}

/// Owned copy of the controller's state at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthSnapshot {
    pub status: AuthStatus,
    pub user: Option<User>,
    pub permissions: Option<PermissionSnapshot>,
}

impl AuthSnapshot {
    fn unauthenticated() -> Self {
        Self::default()
    }

    fn loading() -> Self {
        Self {
            status: AuthStatus::Loading,
            ..Self::default()
        }
    }

    fn authenticated(user: User, permissions: PermissionSnapshot, status: AuthStatus) -> Self {
        Self {
            status,
            user: Some(user),
            permissions: Some(permissions),
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.status, AuthStatus::Authenticated | AuthStatus::Revalidating)
    }

    pub fn is_loading(&self) -> bool {
        self.status == AuthStatus::Loading
    }
}

impl PermissionCheck for AuthSnapshot {
    fn has_permission(&self, code: &PermissionCode) -> bool {
        self.permissions.has_permission(code)
    }

    fn is_loaded(&self) -> bool {
        self.permissions.is_some()
    }
}

/// Which kind of fetch a [`PendingFetch`] performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchKind {
    /// Nothing usable on screen; the UI waits for this.
    Load,
    /// Cached data is on screen; this only refreshes it.
    Revalidate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Fresh user and permissions are now the session.
    Applied,
    /// The fetch failed and the session was cleared.
    Failed,
    /// The session changed while the fetch was in flight; its result was dropped.
    Superseded,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("login rejected: {0}")]
    Rejected(ApiError),
    #[error("signed in, but the session could not be loaded")]
    SessionUnavailable,
    #[error("login superseded by a newer session change")]
    Superseded,
}

/// The external collaborators the controller is wired to.
pub struct Collaborators {
    pub api: Arc<dyn AuthApi>,
    pub tokens: Arc<dyn TokenAccessor>,
    pub storage: Arc<dyn KeyValueStorage>,
    pub navigator: Arc<dyn Navigator>,
    pub clock: Arc<dyn Clock>,
}

type Listener = Arc<dyn Fn(AuthStatus) + Send + Sync>;

struct SessionState {
    snapshot: AuthSnapshot,
    generation: u64,
}

struct Inner {
    api: Arc<dyn AuthApi>,
    tokens: Arc<dyn TokenAccessor>,
    navigator: Arc<dyn Navigator>,
    cache: SessionCache,
    routes: Routes,
    state: RwLock<SessionState>,
    listeners: RwLock<Vec<Listener>>,
}

/// Cheap-to-clone handle on the session; clones share state.
#[derive(Clone)]
pub struct AuthController {
    inner: Arc<Inner>,
}

/// A fetch issued by [`AuthController::mount`] that the host still has to drive.
///
/// Natively this is usually handed to `tokio::spawn`, in the browser to
/// `spawn_local`. Dropping it without running it leaves the controller in
/// whatever state `mount` set.
#[must_use = "the session is only loaded once the pending fetch is run"]
pub struct PendingFetch {
    controller: AuthController,
    generation: u64,
    kind: FetchKind,
}

impl PendingFetch {
    pub fn kind(&self) -> FetchKind {
        self.kind
    }

    pub async fn run(self) -> FetchOutcome {
        self.controller.fetch_and_apply(self.generation, self.kind).await
    }
}

impl core::fmt::Debug for PendingFetch {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PendingFetch")
            .field("generation", &self.generation)
            .field("kind", &self.kind)
            .finish()
    }
}

impl AuthController {
    pub fn new(collaborators: Collaborators, routes: Routes) -> Self {
        let Collaborators {
            api,
            tokens,
            storage,
            navigator,
            clock,
        } = collaborators;

        Self {
            inner: Arc::new(Inner {
                api,
                tokens,
                navigator,
                cache: SessionCache::new(storage, clock),
                routes,
                state: RwLock::new(SessionState {
                    snapshot: AuthSnapshot::unauthenticated(),
                    generation: 0,
                }),
                listeners: RwLock::new(Vec::new()),
            }),
        }
    }

    /// Start a session from whatever is available locally.
    ///
    /// Returns synchronously: with a fresh cache entry the controller is
    /// already authenticated when this returns. The returned fetch (if any)
    /// revalidates or loads the session.
    pub fn mount(&self) -> Option<PendingFetch> {
        if !self.inner.tokens.has_token() {
            tracing::debug!("no access token; session starts unauthenticated");
            self.advance(|_| AuthSnapshot::unauthenticated());
            return None;
        }

        let (generation, kind) = match self.inner.cache.read_fresh() {
            Some(entry) => {
                tracing::debug!(user_id = %entry.user.id, "session hydrated from cache");
                let generation = self.advance(|_| {
                    AuthSnapshot::authenticated(entry.user, entry.permissions, AuthStatus::Revalidating)
                });
                (generation, FetchKind::Revalidate)
            }
            None => (self.advance(|_| AuthSnapshot::loading()), FetchKind::Load),
        };

        Some(PendingFetch {
            controller: self.clone(),
            generation,
            kind,
        })
    }

    /// [`mount`](Self::mount) and wait for the resulting fetch.
    pub async fn initialize(&self) -> AuthStatus {
        if let Some(pending) = self.mount() {
            let _ = pending.run().await;
        }
        self.status()
    }

    /// Sign in, load the new session and redirect to the dashboard.
    ///
    /// On `Err` the session is already `Unauthenticated` (unless a newer
    /// session change took over meanwhile).
    pub async fn login(&self, credentials: &Credentials) -> Result<(), LoginError> {
        let generation = self.advance(|_| AuthSnapshot::loading());

        if let Err(err) = self.inner.api.login(credentials).await {
            tracing::info!("login rejected: {err}");
            self.settle(generation, AuthSnapshot::unauthenticated());
            return Err(LoginError::Rejected(err));
        }

        if !self.is_current(generation) {
            // Signed out (or signed in again) while the request was in flight.
            // Tokens it just issued must not outlive a logout.
            if self.status() == AuthStatus::Unauthenticated {
                tracing::info!("discarding tokens of a login that completed after logout");
                if let Err(err) = self.inner.api.logout().await {
                    tracing::warn!("failed to revoke superseded login: {err}");
                }
            }
            return Err(LoginError::Superseded);
        }

        self.inner.cache.clear();
        match self.fetch_and_apply(generation, FetchKind::Load).await {
            FetchOutcome::Applied => {
                tracing::info!("signed in");
                self.inner.navigator.navigate(&self.inner.routes.dashboard);
                Ok(())
            }
            FetchOutcome::Failed => Err(LoginError::SessionUnavailable),
            FetchOutcome::Superseded => Err(LoginError::Superseded),
        }
    }

    /// Clear the session locally, tell the server, redirect to login.
    ///
    /// Local state is cleared first and regardless of the server call, so any
    /// fetch still in flight is superseded. Safe to call repeatedly.
    pub async fn logout(&self) {
        self.advance(|_| AuthSnapshot::unauthenticated());
        self.inner.cache.clear();

        if let Err(err) = self.inner.api.logout().await {
            tracing::warn!("logout request failed; local session cleared anyway: {err}");
        }

        tracing::info!("signed out");
        self.inner.navigator.navigate(&self.inner.routes.login);
    }

    /// Drop the cache and wait for a fresh session from the server.
    ///
    /// Data already on screen stays visible (`Revalidating`) while the
    /// refetch runs.
    pub async fn refresh_user(&self) -> FetchOutcome {
        self.inner.cache.clear();

        if !self.inner.tokens.has_token() {
            self.advance(|_| AuthSnapshot::unauthenticated());
            return FetchOutcome::Failed;
        }

        let generation = self.advance(|current| {
            if current.is_authenticated() {
                AuthSnapshot {
                    status: AuthStatus::Revalidating,
                    ..current
                }
            } else {
                AuthSnapshot::loading()
            }
        });
        self.fetch_and_apply(generation, FetchKind::Load).await
    }

    pub fn snapshot(&self) -> AuthSnapshot {
        self.read_state().snapshot.clone()
    }

    pub fn status(&self) -> AuthStatus {
        self.read_state().snapshot.status
    }

    pub fn user(&self) -> Option<User> {
        self.read_state().snapshot.user.clone()
    }

    pub fn permissions(&self) -> Option<PermissionSnapshot> {
        self.read_state().snapshot.permissions.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.read_state().snapshot.is_loading()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read_state().snapshot.is_authenticated()
    }

    /// Call `listener` with the new status after every state change.
    ///
    /// Listeners run on whichever task changed the state, outside any lock.
    pub fn subscribe(&self, listener: impl Fn(AuthStatus) + Send + Sync + 'static) {
        self.inner
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Arc::new(listener));
    }

    async fn fetch_and_apply(&self, generation: u64, kind: FetchKind) -> FetchOutcome {
        let api = &self.inner.api;
        let result = tokio::try_join!(api.current_user(), api.current_permissions());

        let (outcome, status) = {
            let mut state = self.write_state();
            if state.generation != generation {
                (FetchOutcome::Superseded, state.snapshot.status)
            } else {
                match result {
                    Ok((user, permissions)) => {
                        // Written under the state lock: a logout slipping in
                        // between the check and the write would leave its
                        // session in storage.
                        self.inner.cache.write(&user, &permissions);
                        state.snapshot =
                            AuthSnapshot::authenticated(user, permissions, AuthStatus::Authenticated);
                        (FetchOutcome::Applied, AuthStatus::Authenticated)
                    }
                    Err(err) => {
                        tracing::warn!(?kind, "failed to load session: {err}");
                        self.inner.cache.clear();
                        state.snapshot = AuthSnapshot::unauthenticated();
                        (FetchOutcome::Failed, AuthStatus::Unauthenticated)
                    }
                }
            }
        };

        if outcome == FetchOutcome::Superseded {
            tracing::debug!(?kind, generation, "discarding response of a superseded session");
        } else {
            self.notify(status);
        }
        outcome
    }

    /// Replace the state and start a new generation; returns that generation.
    fn advance(&self, next: impl FnOnce(AuthSnapshot) -> AuthSnapshot) -> u64 {
        let (generation, status) = {
            let mut state = self.write_state();
            let current = std::mem::take(&mut state.snapshot);
            state.snapshot = next(current);
            state.generation += 1;
            (state.generation, state.snapshot.status)
        };
        self.notify(status);
        generation
    }

    /// Replace the state only if `generation` is still current.
    fn settle(&self, generation: u64, snapshot: AuthSnapshot) {
        let status = {
            let mut state = self.write_state();
            if state.generation != generation {
                return;
            }
            state.snapshot = snapshot;
            state.snapshot.status
        };
        self.notify(status);
    }

    fn notify(&self, status: AuthStatus) {
        let listeners: Vec<Listener> = self
            .inner
            .listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        for listener in listeners {
            listener(status);
        }
    }

    fn is_current(&self, generation: u64) -> bool {
        self.read_state().generation == generation
    }

    fn read_state(&self) -> RwLockReadGuard<'_, SessionState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, SessionState> {
        self.inner.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl PermissionCheck for AuthController {
    fn has_permission(&self, code: &PermissionCode) -> bool {
        self.read_state().snapshot.has_permission(code)
    }

    fn is_loaded(&self) -> bool {
        self.read_state().snapshot.is_loaded()
    }

    fn has_any_permission(&self, codes: &[PermissionCode]) -> bool {
        self.read_state().snapshot.has_any_permission(codes)
    }

    fn has_all_permissions(&self, codes: &[PermissionCode]) -> bool {
        self.read_state().snapshot.has_all_permissions(codes)
    }
}

impl core::fmt::Debug for AuthController {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.read_state();
        f.debug_struct("AuthController")
            .field("status", &state.snapshot.status)
            .field("generation", &state.generation)
            .field("routes", &self.inner.routes)
            .finish_non_exhaustive()
    }
}
