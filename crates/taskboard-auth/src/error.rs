//! Error types for the session pipeline.

use taskboard_config::CoreError;
use taskboard_storage::StorageError;
use thiserror::Error;

/// Error type for session and request operations.
#[derive(Error, Debug)]
pub enum AuthError {
    /// No response from the backend (connect failure, timeout)
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Backend returned 401. The session has already been cleaned up.
    #[error("Not authorized: the session is missing, invalid, or expired")]
    AuthorizationDenied,

    /// Backend returned a 4xx other than 401
    #[error("Request rejected (HTTP {status}): {body}")]
    Validation { status: u16, body: String },

    /// Backend returned a 5xx
    #[error("Server error (HTTP {status}): {body}")]
    Server { status: u16, body: String },

    /// Success response whose body does not match the contract
    #[error("Unexpected response body: {0}")]
    Decode(String),

    /// The session changed while the request was in flight; its result was dropped
    #[error("Session changed while the request was in flight")]
    Superseded,

    /// Caller input that cannot be sent, such as an unusable resource id
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Invalid state transition in the session FSM
    #[error("Invalid session state transition: {0}")]
    InvalidStateTransition(String),

    /// `restore()` runs at most once per process
    #[error("Session restore has already been attempted")]
    RestoreAlreadyAttempted,

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(#[from] CoreError),
}

impl AuthError {
    /// HTTP status carried by the error, if the backend responded.
    pub fn status(&self) -> Option<u16> {
        match self {
            AuthError::AuthorizationDenied => Some(401),
            AuthError::Validation { status, .. } | AuthError::Server { status, .. } => {
                Some(*status)
            }
            AuthError::Network(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Returns true for the centrally handled 401 case.
    pub fn is_authorization_denied(&self) -> bool {
        matches!(self, AuthError::AuthorizationDenied)
    }
}

/// Result type alias using AuthError.
pub type AuthResult<T> = Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AuthError::AuthorizationDenied.status(), Some(401));
        assert_eq!(
            AuthError::Validation {
                status: 422,
                body: "bad".to_string()
            }
            .status(),
            Some(422)
        );
        assert_eq!(
            AuthError::Server {
                status: 503,
                body: String::new()
            }
            .status(),
            Some(503)
        );
        assert_eq!(AuthError::Superseded.status(), None);
        assert_eq!(AuthError::Decode("x".to_string()).status(), None);
    }

    #[test]
    fn test_is_authorization_denied() {
        assert!(AuthError::AuthorizationDenied.is_authorization_denied());
        assert!(!AuthError::Validation {
            status: 403,
            body: String::new()
        }
        .is_authorization_denied());
        assert!(!AuthError::RestoreAlreadyAttempted.is_authorization_denied());
    }

    #[test]
    fn test_validation_message_keeps_body() {
        let err = AuthError::Validation {
            status: 400,
            body: r#"{"message":"Email already exists"}"#.to_string(),
        };
        assert!(err.to_string().contains("Email already exists"));
        assert!(err.to_string().contains("400"));
    }
}
