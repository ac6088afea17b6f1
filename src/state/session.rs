//! Session manager: owner of the auth token lifecycle.
//!
//! SYSTEM CONTEXT
//! ==============
//! UI actions call into [`SessionManager`], which drives the auth endpoints,
//! persists the token, and publishes [`AuthState`] snapshots to subscribers.
//! It is the only writer of the token store.
//!
//! CONCURRENCY
//! ===========
//! Everything runs on the browser's single thread, so state lives in
//! `Rc`/`RefCell`. Operations suspend at network calls and other UI work can
//! interleave. Restoration is generation-guarded: starting a newer restore,
//! logging in, registering, logging out or disposing all bump the generation,
//! and a lookup that resolves under an old generation is dropped. After
//! [`SessionManager::dispose`] no in-flight operation writes state or storage;
//! the underlying requests still run to completion.
//!
//! Login, register and logout do not exclude each other. `loading` is a hint
//! for disabling controls, not a lock. A sign-in only attaches its profile
//! while the token it stored is still the session's token.

#[cfg(test)]
#[path = "session_test.rs"]
mod session_test;

use std::cell::{Cell, RefCell};
use std::future::Future;
use std::rc::Rc;

use crate::net::api::AuthApi;
use crate::net::error::ApiError;
use crate::net::types::{AuthResponse, LoginPayload, RegisterPayload};
use crate::state::auth::AuthState;
use crate::util::token_storage::TokenStore;

type Listener = Rc<dyn Fn(&AuthState)>;

/// Cloneable handle to one session. Clones share state.
pub struct SessionManager<A, S> {
    inner: Rc<SessionInner<A, S>>,
}

struct SessionInner<A, S> {
    api: A,
    store: S,
    state: RefCell<AuthState>,
    generation: Cell<u64>,
    disposed: Cell<bool>,
    listeners: RefCell<Vec<Listener>>,
}

impl<A, S> Clone for SessionManager<A, S> {
    fn clone(&self) -> Self {
        Self { inner: Rc::clone(&self.inner) }
    }
}

impl<A: AuthApi, S: TokenStore> SessionManager<A, S> {
    /// Create a session seeded from the persisted token.
    ///
    /// The store is read once here. With a stored token the session starts
    /// out `loading` until [`SessionManager::restore`] settles.
    pub fn new(api: A, store: S) -> Self {
        let token = store.load();
        let state = AuthState { loading: token.is_some(), token, ..AuthState::default() };
        Self {
            inner: Rc::new(SessionInner {
                api,
                store,
                state: RefCell::new(state),
                generation: Cell::new(0),
                disposed: Cell::new(false),
                listeners: RefCell::new(Vec::new()),
            }),
        }
    }

    pub fn state(&self) -> AuthState {
        self.inner.state.borrow().clone()
    }

    pub fn is_disposed(&self) -> bool {
        self.inner.disposed.get()
    }

    /// Register a callback run after every committed state change.
    pub fn subscribe(&self, listener: impl Fn(&AuthState) + 'static) {
        self.inner.listeners.borrow_mut().push(Rc::new(listener));
    }

    /// Revalidate the current token into a live session.
    ///
    /// Without a token this only clears `loading`. A failed lookup erases the
    /// token silently: it is logged but never reported through `error`.
    pub async fn restore(&self) {
        let generation = self.bump_generation();
        let token = self.inner.state.borrow().token.clone();
        let Some(token) = token else {
            self.commit(|s| s.loading = false);
            return;
        };
        self.commit(|s| s.loading = true);

        let lookup = self.inner.api.current_user(&token).await;
        if !self.is_current(generation) {
            log::debug!("discarding stale session restore");
            return;
        }
        match lookup {
            Ok(user) => self.commit(|s| {
                s.user = Some(user);
                s.loading = false;
            }),
            Err(err) => {
                log::error!("error loading user: {err}");
                self.clear_session();
                self.commit(|s| s.loading = false);
            }
        }
    }

    /// Sign in with username or email plus password.
    ///
    /// # Errors
    ///
    /// Returns the failure of either the login call or the follow-up profile
    /// lookup; the same message is recorded in `error`.
    pub async fn login(&self, payload: LoginPayload) -> Result<(), ApiError> {
        self.sign_in("logging in", self.inner.api.login(&payload)).await
    }

    /// Create an account and sign in with the returned token.
    ///
    /// # Errors
    ///
    /// Same contract as [`SessionManager::login`].
    pub async fn register(&self, payload: RegisterPayload) -> Result<(), ApiError> {
        self.sign_in("registering", self.inner.api.register(&payload)).await
    }

    /// End the session. The remote call is best-effort; local state and
    /// storage are always cleared.
    pub async fn logout(&self) {
        self.begin_operation();
        let token = self.inner.state.borrow().token.clone();
        if let Some(token) = token {
            if let Err(err) = self.inner.api.logout(&token).await {
                log::warn!("error logging out: {err}");
            }
        }
        self.clear_session();
        self.commit(|s| s.loading = false);
    }

    pub fn clear_error(&self) {
        self.commit(|s| s.error = None);
    }

    /// Tear down: pending operations resume as no-ops and listeners are dropped.
    pub fn dispose(&self) {
        self.inner.disposed.set(true);
        self.bump_generation();
        self.inner.listeners.borrow_mut().clear();
    }

    async fn sign_in<F>(&self, action: &str, request: F) -> Result<(), ApiError>
    where
        F: Future<Output = Result<AuthResponse, ApiError>>,
    {
        self.begin_operation();
        let mut issued = None;
        let outcome = async {
            let AuthResponse { key } = request.await?;
            self.persist_token(Some(&key));
            issued = Some(key.clone());
            let user = self.inner.api.current_user(&key).await?;
            if self.holds_token(&key) {
                self.commit(|s| s.user = Some(user));
            } else {
                log::debug!("discarding profile for superseded token");
            }
            Ok::<(), ApiError>(())
        }
        .await;

        if let Err(err) = &outcome {
            log::error!("error {action}: {err}");
            // A token replaced or cleared while its profile loaded belongs to
            // someone else now; leave that session alone.
            let superseded = issued.as_deref().is_some_and(|key| !self.holds_token(key));
            if !superseded {
                self.clear_session();
                let message = err.to_string();
                self.commit(|s| s.error = Some(message));
            }
        }
        self.commit(|s| s.loading = false);
        outcome
    }

    fn begin_operation(&self) {
        self.bump_generation();
        self.commit(|s| {
            s.error = None;
            s.loading = true;
        });
    }

    fn clear_session(&self) {
        self.commit(|s| s.user = None);
        self.persist_token(None);
    }

    /// Write `token` to storage and state together. A different token
    /// invalidates the current user until it is looked up again.
    fn persist_token(&self, token: Option<&str>) {
        if self.is_disposed() {
            return;
        }
        match token {
            Some(token) => self.inner.store.save(token),
            None => self.inner.store.clear(),
        }
        let token = token.map(str::to_owned);
        self.commit(|s| {
            if s.token != token {
                s.user = None;
            }
            s.token = token;
        });
    }

    fn holds_token(&self, token: &str) -> bool {
        self.inner.state.borrow().token.as_deref() == Some(token)
    }

    fn bump_generation(&self) -> u64 {
        let next = self.inner.generation.get().wrapping_add(1);
        self.inner.generation.set(next);
        next
    }

    fn is_current(&self, generation: u64) -> bool {
        !self.is_disposed() && self.inner.generation.get() == generation
    }

    fn commit(&self, apply: impl FnOnce(&mut AuthState)) {
        if self.is_disposed() {
            return;
        }
        let snapshot = {
            let mut state = self.inner.state.borrow_mut();
            apply(&mut state);
            state.clone()
        };
        let listeners = self.inner.listeners.borrow().clone();
        for listener in listeners {
            listener(&snapshot);
        }
    }
}
