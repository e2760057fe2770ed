//! Wire types for the authentication endpoints.

use serde::{Deserialize, Serialize};

/// Authenticated user as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// User id; older backends send `_id`
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub email: String,
}

/// Response body of `POST /auth/login` and `POST /auth/register`.
///
/// Both fields are optional on the wire so a malformed success can be
/// reported precisely instead of as a generic decode failure.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub user: Option<User>,
}

/// Response body of `GET /auth/profile`.
#[derive(Debug, Clone, Deserialize)]
pub struct ProfileResponse {
    pub user: User,
}

#[derive(Debug, Serialize)]
pub(crate) struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub name: &'a str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_accepts_mongo_style_id() {
        let user: User =
            serde_json::from_str(r#"{"_id":"abc","name":"A","email":"a@b.com"}"#).unwrap();
        assert_eq!(user.id, "abc");
    }

    #[test]
    fn test_user_name_is_optional() {
        let user: User = serde_json::from_str(r#"{"id":"1","email":"a@b.com"}"#).unwrap();
        assert_eq!(user.name, "");
    }

    #[test]
    fn test_auth_response_partial() {
        let response: AuthResponse =
            serde_json::from_str(r#"{"message":"ok","token":"T1"}"#).unwrap();
        assert_eq!(response.token.as_deref(), Some("T1"));
        assert!(response.user.is_none());
    }

    #[test]
    fn test_register_request_shape() {
        let body = serde_json::to_value(RegisterRequest {
            email: "a@b.com",
            password: "x",
            name: "A",
        })
        .unwrap();
        assert_eq!(
            body,
            serde_json::json!({"email": "a@b.com", "password": "x", "name": "A"})
        );
    }
}
