//! Session lifecycle: restore, login, register, logout.
//!
//! `SessionManager` drives the FSM in [`SessionContext`] from the results of
//! the auth endpoints. All HTTP traffic goes through the shared
//! [`RequestPipeline`], so a 401 on any of these calls is handled the same way
//! as a 401 on a project or task request.

use crate::auth_fsm::SessionState;
use crate::context::{SessionContext, SessionInvalidated};
use crate::models::{AuthResponse, LoginRequest, ProfileResponse, RegisterRequest, User};
use crate::pipeline::RequestPipeline;
use crate::{AuthError, AuthResult};
use std::sync::Arc;
use taskboard_config::Config;
use taskboard_storage::SessionStore;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// Session lifecycle controller.
#[derive(Clone, Debug)]
pub struct SessionManager {
    context: Arc<SessionContext>,
    pipeline: RequestPipeline,
}

impl SessionManager {
    /// Create a manager over an existing pipeline and its context.
    pub fn new(pipeline: RequestPipeline) -> Self {
        Self {
            context: pipeline.context().clone(),
            pipeline,
        }
    }

    /// Build the context, pipeline and manager from configuration.
    pub fn from_config(config: &Config, store: SessionStore) -> AuthResult<Self> {
        let context = Arc::new(SessionContext::new(store, config.login_route.clone()));
        let pipeline = RequestPipeline::new(config, context)?;
        Ok(Self::new(pipeline))
    }

    /// Current session state.
    pub fn state(&self) -> SessionState {
        self.context.state()
    }

    /// Subscribe to session state changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.context.subscribe()
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.context
    }

    /// Pipeline for other backend consumers.
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    /// Register the handler invoked after logout or a 401 cleanup.
    pub fn on_session_invalidated<F>(&self, callback: F)
    where
        F: Fn(&SessionInvalidated) + Send + Sync + 'static,
    {
        self.context.on_session_invalidated(callback);
    }

    /// Validate the stored token against the backend. Runs at most once.
    ///
    /// With no stored token this resolves to `Unauthenticated` without any
    /// request. Otherwise the state is `Restoring` until `GET /auth/profile`
    /// answers: success yields `Authenticated(user)`, any failure clears the
    /// store and yields `Unauthenticated`. If the session changed while the
    /// profile request was in flight, the late result is dropped.
    pub async fn restore(&self) -> AuthResult<SessionState> {
        let Some((_, generation)) = self.context.begin_restore()? else {
            return Ok(self.state());
        };

        info!(generation, "Restoring session from stored token");

        match self.pipeline.get::<ProfileResponse>("/auth/profile").await {
            Ok(profile) => {
                let user_id = profile.user.id.clone();
                if self.context.finish_restore_verified(generation, profile.user)? {
                    info!(user_id = %user_id, "Session restored");
                } else {
                    debug!("Session changed during restore, discarding profile");
                }
            }
            Err(e) => {
                warn!(error = %e, "Session restore failed, clearing session");
                self.context.finish_restore_rejected(generation)?;
            }
        }

        Ok(self.state())
    }

    /// Log in with email and password.
    pub async fn login(&self, email: &str, password: &str) -> AuthResult<User> {
        let generation = self.begin_authentication()?;
        debug!("Logging in");

        let response: AuthResponse = self
            .pipeline
            .post("/auth/login", &LoginRequest { email, password })
            .await
            .map_err(|e| {
                warn!(error = %e, "Login failed");
                e
            })?;

        let user = self.complete_authentication(generation, response)?;
        info!(user_id = %user.id, "Login successful");
        Ok(user)
    }

    /// Create an account and start a session for it.
    pub async fn register(&self, email: &str, password: &str, name: &str) -> AuthResult<User> {
        let generation = self.begin_authentication()?;
        debug!("Registering account");

        let response: AuthResponse = self
            .pipeline
            .post(
                "/auth/register",
                &RegisterRequest {
                    email,
                    password,
                    name,
                },
            )
            .await
            .map_err(|e| {
                warn!(error = %e, "Registration failed");
                e
            })?;

        let user = self.complete_authentication(generation, response)?;
        info!(user_id = %user.id, "Registration successful");
        Ok(user)
    }

    /// End the session. Idempotent and never fails.
    pub fn logout(&self) {
        self.context.logout();
        info!("Logged out");
    }

    fn begin_authentication(&self) -> AuthResult<u64> {
        match self.state() {
            SessionState::Authenticated(_) => Err(AuthError::InvalidStateTransition(
                "already authenticated, log out first".to_string(),
            )),
            SessionState::Restoring => Err(AuthError::InvalidStateTransition(
                "session restore in progress".to_string(),
            )),
            SessionState::Unauthenticated => Ok(self.context.generation()),
        }
    }

    fn complete_authentication(&self, generation: u64, response: AuthResponse) -> AuthResult<User> {
        let token = response
            .token
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AuthError::Decode("response is missing the token".to_string()))?;
        let user = response
            .user
            .ok_or_else(|| AuthError::Decode("response is missing the user".to_string()))?;

        self.context.establish(generation, &token, user.clone())?;
        Ok(user)
    }
}
