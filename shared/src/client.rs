//! Client-related types shared between server and client
//!
//! Request/response bodies of the `/api/auth/*` endpoints.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::models::User;

// =============================================================================
// Auth API DTOs
// =============================================================================

/// Login request
///
/// Either `username` or `email` identifies the account.
#[derive(Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub password: String,
}

impl LoginRequest {
    pub fn with_username(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            email: None,
            password: password.into(),
        }
    }

    pub fn with_email(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: None,
            email: Some(email.into()),
            password: password.into(),
        }
    }

    /// The identity used to log in
    pub fn identity(&self) -> Option<&str> {
        self.username.as_deref().or(self.email.as_deref())
    }
}

// 密码不进日志
impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

/// Login response data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: User,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_debug_redacts_password() {
        let req = LoginRequest::with_username("chef", "s3cret");
        let dbg = format!("{:?}", req);
        assert!(!dbg.contains("s3cret"));
        assert!(dbg.contains("chef"));
    }

    #[test]
    fn test_email_login_serializes_without_username() {
        let req = LoginRequest::with_email("a@b.c", "pw");
        let json = serde_json::to_value(&req).unwrap();
        assert!(json.get("username").is_none());
        assert_eq!(json["email"], "a@b.c");
    }
}
