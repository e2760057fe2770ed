//! Session lifecycle and request authorization for the Taskboard client.
//!
//! This crate provides:
//! - An explicit FSM for the session lifecycle (`rust-fsm`)
//! - `SessionContext`: the shared, injectable session state
//! - `RequestPipeline`: the HTTP client that attaches the bearer token and
//!   handles authorization failures centrally
//! - `SessionManager`: restore/login/register/logout

mod auth_fsm;
mod context;
mod error;
mod models;
mod pipeline;
mod session;

pub use auth_fsm::session_machine;
pub use auth_fsm::{SessionMachine, SessionMachineInput, SessionMachineState, SessionState};
pub use context::{InvalidationReason, SessionContext, SessionInvalidated, SessionInvalidatedCallback};
pub use error::{AuthError, AuthResult};
pub use models::{AuthResponse, ProfileResponse, User};
pub use pipeline::{bearer_value, classify_status, RequestPipeline, StatusClass};
pub use session::SessionManager;
