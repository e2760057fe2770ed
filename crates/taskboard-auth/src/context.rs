//! Shared session context.
//!
//! `SessionContext` owns the session store, the FSM, the in-memory user and the
//! session generation. The request pipeline and the session manager hold it
//! through an `Arc`; consumers read state through [`SessionContext::state`] and
//! [`SessionContext::subscribe`].
//!
//! Every store write and state change happens under one lock, and the lock is
//! never held across an `.await`. The generation is bumped on every token
//! change so that results computed against an older session can be detected
//! and dropped.

use crate::auth_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
use crate::models::User;
use crate::{AuthError, AuthResult};
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use taskboard_storage::SessionStore;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    /// Explicit `logout()`.
    Logout,
    /// The backend answered 401.
    AuthorizationDenied,
}

/// Payload of the session-invalidated event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInvalidated {
    pub reason: InvalidationReason,
    /// Login entry point the host should navigate to.
    pub login_route: String,
    /// Generation of the session after cleanup.
    pub generation: u64,
}

/// Callback invoked after a session has been cleared.
pub type SessionInvalidatedCallback = Arc<dyn Fn(&SessionInvalidated) + Send + Sync>;

struct SessionInner {
    machine: SessionMachine,
    user: Option<User>,
    generation: u64,
    restore_attempted: bool,
}

/// Explicit session context shared by the pipeline, the manager, and consumers.
pub struct SessionContext {
    store: SessionStore,
    inner: Mutex<SessionInner>,
    state_tx: watch::Sender<SessionState>,
    login_route: String,
    invalidated_callback: Mutex<Option<SessionInvalidatedCallback>>,
}

impl SessionContext {
    /// Create a context over a session store.
    pub fn new(store: SessionStore, login_route: impl Into<String>) -> Self {
        let (state_tx, _) = watch::channel(SessionState::Unauthenticated);
        Self {
            store,
            inner: Mutex::new(SessionInner {
                machine: SessionMachine::new(),
                user: None,
                generation: 0,
                restore_attempted: false,
            }),
            state_tx,
            login_route: login_route.into(),
            invalidated_callback: Mutex::new(None),
        }
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.state_tx.borrow().clone()
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.state_tx.subscribe()
    }

    /// Current session generation.
    pub fn generation(&self) -> u64 {
        self.inner.lock().generation
    }

    /// Login entry point carried by invalidation events.
    pub fn login_route(&self) -> &str {
        &self.login_route
    }

    /// Token currently held by the store.
    pub fn stored_token(&self) -> AuthResult<Option<String>> {
        Ok(self.store.get()?)
    }

    /// Register the session-invalidated handler, replacing any previous one.
    ///
    /// The handler runs after the store has been cleared and the new state
    /// published, outside the context lock.
    pub fn on_session_invalidated<F>(&self, callback: F)
    where
        F: Fn(&SessionInvalidated) + Send + Sync + 'static,
    {
        *self.invalidated_callback.lock() = Some(Arc::new(callback));
    }

    /// Token to attach to an outgoing request, with the generation it belongs to.
    ///
    /// Never fails: a store read error is logged and the request goes out
    /// without credentials.
    pub(crate) fn token_for_request(&self) -> (Option<String>, u64) {
        let inner = self.inner.lock();
        let token = match self.store.get() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Could not read session token, sending request unauthenticated");
                None
            }
        };
        (token, inner.generation)
    }

    /// Start the one-time restore.
    ///
    /// Returns the stored token and the generation it belongs to, or `None`
    /// when there is nothing to restore (state stays `Unauthenticated`).
    pub(crate) fn begin_restore(&self) -> AuthResult<Option<(String, u64)>> {
        let mut inner = self.inner.lock();
        if inner.restore_attempted {
            return Err(AuthError::RestoreAlreadyAttempted);
        }
        inner.restore_attempted = true;

        if *inner.machine.state() != SessionMachineState::Unauthenticated {
            debug!("Session already established, nothing to restore");
            return Ok(None);
        }

        let token = match self.store.get() {
            Ok(Some(token)) => token,
            Ok(None) => {
                info!("No stored session token");
                return Ok(None);
            }
            Err(e) => {
                warn!(error = %e, "Stored session token is unreadable, clearing");
                if let Err(e) = self.store.clear() {
                    error!(error = %e, "Failed to clear unreadable session token");
                }
                return Ok(None);
            }
        };

        self.transition(&mut inner, &SessionMachineInput::RestoreStarted)?;
        Ok(Some((token, inner.generation)))
    }

    /// Apply a successful profile fetch. Returns false if the result is stale.
    pub(crate) fn finish_restore_verified(&self, generation: u64, user: User) -> AuthResult<bool> {
        let mut inner = self.inner.lock();
        if !Self::is_current(&inner, generation) {
            return Ok(false);
        }

        inner.user = Some(user);
        self.transition(&mut inner, &SessionMachineInput::ProfileVerified)?;
        Ok(true)
    }

    /// Apply a failed profile fetch. Returns false if the result is stale.
    pub(crate) fn finish_restore_rejected(&self, generation: u64) -> AuthResult<bool> {
        let mut inner = self.inner.lock();
        if !Self::is_current(&inner, generation) {
            return Ok(false);
        }

        let cleared = self.store.clear();
        inner.generation += 1;
        inner.user = None;
        self.transition(&mut inner, &SessionMachineInput::ProfileRejected)?;
        cleared?;
        Ok(true)
    }

    /// Store a freshly issued token and mark the session authenticated.
    ///
    /// `generation` is the generation observed when the login request started;
    /// if the session changed since, the result is dropped.
    pub(crate) fn establish(&self, generation: u64, token: &str, user: User) -> AuthResult<()> {
        let mut inner = self.inner.lock();
        if !Self::is_current(&inner, generation) {
            return Err(AuthError::Superseded);
        }
        if *inner.machine.state() == SessionMachineState::Authenticated {
            return Err(AuthError::InvalidStateTransition(
                "a session is already established".to_string(),
            ));
        }

        self.store.set(token)?;
        inner.generation += 1;
        inner.user = Some(user);
        self.transition(&mut inner, &SessionMachineInput::Authenticate)
    }

    /// Clear the session after a 401.
    ///
    /// `sent_generation` is the generation of the token the failed request
    /// carried. A 401 for an older token does not touch the newer session.
    /// Returns whether cleanup ran.
    pub(crate) fn handle_authorization_denied(&self, sent_generation: u64) -> bool {
        self.invalidate(InvalidationReason::AuthorizationDenied, Some(sent_generation))
    }

    /// Clear the session on explicit logout.
    pub(crate) fn logout(&self) {
        self.invalidate(InvalidationReason::Logout, None);
    }

    fn invalidate(&self, reason: InvalidationReason, sent_generation: Option<u64>) -> bool {
        let event = {
            let mut inner = self.inner.lock();
            if let Some(sent) = sent_generation {
                if sent != inner.generation {
                    debug!(
                        sent_generation = sent,
                        current_generation = inner.generation,
                        "Ignoring authorization failure for a replaced session"
                    );
                    return false;
                }
            }

            // Nothing to invalidate: keep the generation so an in-flight login
            // is not superseded.
            let had_session = *inner.machine.state() != SessionMachineState::Unauthenticated
                || !matches!(self.store.get(), Ok(None));

            if let Err(e) = self.store.clear() {
                error!(error = %e, ?reason, "Failed to clear session token");
            }

            if reason == InvalidationReason::Logout || had_session {
                inner.generation += 1;
                inner.user = None;

                let input = match reason {
                    InvalidationReason::Logout => SessionMachineInput::LogoutRequested,
                    InvalidationReason::AuthorizationDenied => {
                        SessionMachineInput::AuthorizationDenied
                    }
                };
                if let Err(e) = self.transition(&mut inner, &input) {
                    // Cleanup inputs are valid in every state; keep the published
                    // state consistent with the cleared store regardless.
                    error!(error = %e, "Unexpected transition failure during cleanup");
                    self.publish(&inner);
                }
            }

            SessionInvalidated {
                reason,
                login_route: self.login_route.clone(),
                generation: inner.generation,
            }
        };

        info!(reason = ?event.reason, generation = event.generation, "Session invalidated");

        let callback = self.invalidated_callback.lock().clone();
        if let Some(callback) = callback {
            callback(&event);
        }
        true
    }

    fn is_current(inner: &SessionInner, generation: u64) -> bool {
        if inner.generation == generation {
            return true;
        }
        debug!(
            expected_generation = generation,
            current_generation = inner.generation,
            "Dropping result for a replaced session"
        );
        false
    }

    /// Transition the FSM and publish the new state.
    fn transition(&self, inner: &mut SessionInner, input: &SessionMachineInput) -> AuthResult<()> {
        let old_state = inner.machine.state().clone();

        inner.machine.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                inner.machine.state()
            ))
        })?;

        if *inner.machine.state() != old_state {
            debug!(
                old_state = ?old_state,
                new_state = ?inner.machine.state(),
                generation = inner.generation,
                "Session state transition"
            );
        }

        self.publish(inner);
        Ok(())
    }

    fn publish(&self, inner: &SessionInner) {
        let state = SessionState::from_machine(inner.machine.state(), inner.user.as_ref());
        self.state_tx.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}

impl std::fmt::Debug for SessionContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionContext")
            .field("state", &self.state())
            .field("generation", &self.generation())
            .field("login_route", &self.login_route)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use taskboard_storage::MemoryStorage;

    fn user() -> User {
        User {
            id: "1".to_string(),
            name: "A".to_string(),
            email: "a@b.com".to_string(),
        }
    }

    fn context_with_token(token: Option<&str>) -> Arc<SessionContext> {
        let store = SessionStore::new(Box::new(MemoryStorage::new()));
        if let Some(token) = token {
            store.set(token).unwrap();
        }
        Arc::new(SessionContext::new(store, "/login"))
    }

    #[test]
    fn test_initial_state() {
        let context = context_with_token(None);
        assert_eq!(context.state(), SessionState::Unauthenticated);
        assert_eq!(context.generation(), 0);
        assert_eq!(context.login_route(), "/login");
    }

    #[test]
    fn test_establish_stores_token_and_publishes_user() {
        let context = context_with_token(None);
        let mut rx = context.subscribe();

        context.establish(0, "T1", user()).unwrap();

        assert_eq!(context.stored_token().unwrap(), Some("T1".to_string()));
        assert_eq!(context.state(), SessionState::Authenticated(user()));
        assert_eq!(context.generation(), 1);
        assert!(rx.has_changed().unwrap());
        assert!(rx.borrow_and_update().is_authenticated());
    }

    #[test]
    fn test_establish_with_stale_generation_is_superseded() {
        let context = context_with_token(None);
        context.logout();

        let result = context.establish(0, "T1", user());
        assert!(matches!(result, Err(AuthError::Superseded)));
        assert_eq!(context.stored_token().unwrap(), None);
        assert_eq!(context.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_establish_twice_is_rejected() {
        let context = context_with_token(None);
        context.establish(0, "T1", user()).unwrap();

        let result = context.establish(1, "T2", user());
        assert!(matches!(result, Err(AuthError::InvalidStateTransition(_))));
        assert_eq!(context.stored_token().unwrap(), Some("T1".to_string()));
    }

    #[test]
    fn test_token_for_request_tracks_generation() {
        let context = context_with_token(Some("T0"));
        assert_eq!(context.token_for_request(), (Some("T0".to_string()), 0));

        context.logout();
        assert_eq!(context.token_for_request(), (None, 1));
    }

    #[test]
    fn test_authorization_denied_clears_before_callback() {
        let context = context_with_token(None);
        context.establish(0, "T1", user()).unwrap();

        let observed = Arc::new(Mutex::new(None));
        let observed_clone = observed.clone();
        let ctx = context.clone();
        context.on_session_invalidated(move |event| {
            *observed_clone.lock() = Some((
                event.clone(),
                ctx.stored_token().unwrap(),
                ctx.state(),
            ));
        });

        assert!(context.handle_authorization_denied(1));

        let (event, token, state) = observed.lock().clone().unwrap();
        assert_eq!(event.reason, InvalidationReason::AuthorizationDenied);
        assert_eq!(event.login_route, "/login");
        assert_eq!(token, None);
        assert_eq!(state, SessionState::Unauthenticated);
    }

    #[test]
    fn test_authorization_denied_for_replaced_token_is_ignored() {
        let context = context_with_token(None);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        context.on_session_invalidated(move |_| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        // A request went out at generation 0, then a login replaced the session.
        context.establish(0, "T1", user()).unwrap();
        assert!(!context.handle_authorization_denied(0));

        assert_eq!(context.stored_token().unwrap(), Some("T1".to_string()));
        assert!(context.state().is_authenticated());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_authorization_denied_without_session_keeps_generation() {
        let context = context_with_token(None);
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        context.on_session_invalidated(move |event| {
            assert_eq!(event.reason, InvalidationReason::AuthorizationDenied);
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        // A login started at generation 0 while an anonymous request got a 401.
        assert!(context.handle_authorization_denied(0));
        assert_eq!(context.generation(), 0);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        context.establish(0, "T1", user()).unwrap();
        assert_eq!(context.stored_token().unwrap(), Some("T1".to_string()));
        assert!(context.state().is_authenticated());
    }

    #[test]
    fn test_logout_is_idempotent_and_fires_each_time() {
        let context = context_with_token(Some("T0"));
        let calls = Arc::new(AtomicUsize::new(0));
        let calls_clone = calls.clone();
        context.on_session_invalidated(move |event| {
            assert_eq!(event.reason, InvalidationReason::Logout);
            calls_clone.fetch_add(1, Ordering::SeqCst);
        });

        context.logout();
        assert_eq!(context.stored_token().unwrap(), None);
        context.logout();
        assert_eq!(context.stored_token().unwrap(), None);

        assert_eq!(context.state(), SessionState::Unauthenticated);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_begin_restore_without_token() {
        let context = context_with_token(None);
        assert!(context.begin_restore().unwrap().is_none());
        assert_eq!(context.state(), SessionState::Unauthenticated);
    }

    #[test]
    fn test_begin_restore_only_once() {
        let context = context_with_token(Some("T0"));
        let (token, generation) = context.begin_restore().unwrap().unwrap();
        assert_eq!(token, "T0");
        assert_eq!(generation, 0);
        assert_eq!(context.state(), SessionState::Restoring);

        assert!(matches!(
            context.begin_restore(),
            Err(AuthError::RestoreAlreadyAttempted)
        ));
    }

    #[test]
    fn test_restore_verified_and_rejected() {
        let context = context_with_token(Some("T0"));
        let (_, generation) = context.begin_restore().unwrap().unwrap();
        assert!(context.finish_restore_verified(generation, user()).unwrap());
        assert_eq!(context.state(), SessionState::Authenticated(user()));

        let context = context_with_token(Some("T0"));
        let (_, generation) = context.begin_restore().unwrap().unwrap();
        assert!(context.finish_restore_rejected(generation).unwrap());
        assert_eq!(context.state(), SessionState::Unauthenticated);
        assert_eq!(context.stored_token().unwrap(), None);
    }

    #[test]
    fn test_stale_restore_success_does_not_resurrect_session() {
        let context = context_with_token(Some("T0"));
        let (_, generation) = context.begin_restore().unwrap().unwrap();

        context.logout();
        assert!(!context.finish_restore_verified(generation, user()).unwrap());

        assert_eq!(context.state(), SessionState::Unauthenticated);
        assert_eq!(context.stored_token().unwrap(), None);
    }
}
