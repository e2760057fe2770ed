//! Session state machine using rust-fsm.
//!
//! ## State Diagram
//!
//! ```text
//!            ┌───────────────────┐
//!            │  Unauthenticated  │ (initial)
//!            └─────────┬─────────┘
//!    RestoreStarted    │   Authenticate (login/register)
//!         ┌────────────┴─────────────┐
//!         ▼                          ▼
//! ┌───────────────┐  ProfileVerified  ┌─────────────────┐
//! │   Restoring   │ ────────────────► │  Authenticated  │
//! └───────┬───────┘                   └────────┬────────┘
//!         │ ProfileRejected /                  │ LogoutRequested /
//!         │ AuthorizationDenied /              │ AuthorizationDenied
//!         │ LogoutRequested                    │
//!         ▼                                    ▼
//!                   Unauthenticated
//! ```
//!
//! `LogoutRequested` and `AuthorizationDenied` are accepted in every state so
//! that both cleanup paths stay idempotent.

use crate::models::User;
use rust_fsm::*;
use serde::{Deserialize, Serialize};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub session_machine(Unauthenticated)

    Unauthenticated => {
        RestoreStarted => Restoring,
        Authenticate => Authenticated,
        AuthorizationDenied => Unauthenticated,
        LogoutRequested => Unauthenticated
    },
    Restoring => {
        ProfileVerified => Authenticated,
        ProfileRejected => Unauthenticated,
        // A login that raced the restore wins; the restore result is dropped.
        Authenticate => Authenticated,
        AuthorizationDenied => Unauthenticated,
        LogoutRequested => Unauthenticated
    },
    Authenticated => {
        AuthorizationDenied => Unauthenticated,
        LogoutRequested => Unauthenticated
    }
}

pub use session_machine::Input as SessionMachineInput;
pub use session_machine::State as SessionMachineState;
pub use session_machine::StateMachine as SessionMachine;

/// Published session state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "user", rename_all = "snake_case")]
pub enum SessionState {
    /// No session.
    Unauthenticated,
    /// Startup check in flight. Consumers must not redirect yet.
    Restoring,
    /// Valid session for this user.
    Authenticated(User),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    /// Returns true while the startup restore is outstanding.
    pub fn is_pending(&self) -> bool {
        matches!(self, SessionState::Restoring)
    }

    pub fn user(&self) -> Option<&User> {
        match self {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    /// Build the published state from the machine state and the in-memory user.
    ///
    /// An `Authenticated` machine without a user cannot be published as
    /// authenticated and is reported as `Unauthenticated`.
    pub(crate) fn from_machine(state: &SessionMachineState, user: Option<&User>) -> Self {
        match (state, user) {
            (SessionMachineState::Restoring, _) => SessionState::Restoring,
            (SessionMachineState::Authenticated, Some(user)) => {
                SessionState::Authenticated(user.clone())
            }
            _ => SessionState::Unauthenticated,
        }
    }
}
